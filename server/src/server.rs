//! The event bus and the socket server.
//!
//! Every client session feeds one process-wide dispatcher channel; a pump
//! thread fans each event out to every registered handler. Handlers get
//! their own serialized process loop on their own thread, so a slow
//! handler delays only itself and each handler sees events in dispatch
//! order. The bus is injected, never global, so tests build isolated ones.
//!
//! Transport framing is one JSON object per line over a plain TCP stream.

use crate::event::Event;
use crate::message::{Message, Response};
use crate::player::Player;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// A component that consumes bus events. Registered once at startup.
pub trait Handler: Send + Sync {
    fn process(&self, event: Event);
}

/// The dispatcher channel all components publish through.
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl EventBus {
    pub fn new() -> EventBus {
        let (tx, rx) = unbounded();
        EventBus { tx, rx }
    }

    /// A handle for publishing onto the bus; handlers that emit follow-up
    /// events each hold one.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }
}

impl Default for EventBus {
    fn default() -> EventBus {
        EventBus::new()
    }
}

pub struct Server {
    events: Sender<Event>,
    inbox: Receiver<Event>,
    handlers: Vec<Arc<dyn Handler>>,
    running: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Server {
    pub fn new(bus: EventBus, handlers: Vec<Arc<dyn Handler>>) -> Server {
        Server {
            events: bus.tx,
            inbox: bus.rx,
            handlers,
            running: AtomicBool::new(true),
            local_addr: Mutex::new(None),
        }
    }

    /// The address actually bound, available once `listen` is up. Useful
    /// when binding port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    /// Bind, start the handler loops, and accept sessions until shutdown.
    pub fn listen(&self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr)?;
        let local = listener.local_addr()?;
        *self.local_addr.lock().unwrap() = Some(local);

        info!("listening on {}", local);
        self.spawn_handlers();

        for stream in listener.incoming() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => self.accept(stream),
                Err(err) => warn!("accept failed: {}", err),
            }
        }

        info!("listener on {} closed", local);
        Ok(())
    }

    /// Stop accepting connections. Live sessions and games drain on their
    /// own threads.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);

        // Wake the accept loop so it observes the flag.
        if let Some(addr) = self.local_addr() {
            let _ = TcpStream::connect(addr);
        }
    }

    /// One serialized process loop per handler, fed by a single pump that
    /// fans each dispatched event out. Everything winds down when the last
    /// bus sender is dropped.
    fn spawn_handlers(&self) {
        let mut feeds: Vec<Sender<Event>> = Vec::with_capacity(self.handlers.len());

        for handler in &self.handlers {
            let (tx, rx) = unbounded::<Event>();
            let handler = Arc::clone(handler);

            thread::spawn(move || {
                while let Ok(event) = rx.recv() {
                    handler.process(event);
                }
            });

            feeds.push(tx);
        }

        let inbox = self.inbox.clone();
        thread::spawn(move || {
            while let Ok(event) = inbox.recv() {
                for feed in &feeds {
                    let _ = feed.send(event.clone());
                }
            }
        });
    }

    /// Wrap a fresh connection as a player session: a writer thread
    /// draining the outbound channel and a reader thread stamping inbound
    /// frames with the player and forwarding them to the dispatcher. A
    /// closed or broken socket posts a synthetic Disconnected.
    fn accept(&self, stream: TcpStream) {
        let writer_stream = match stream.try_clone() {
            Ok(clone) => clone,
            Err(err) => {
                warn!("could not split connection: {}", err);
                return;
            }
        };

        let (out_tx, out_rx) = unbounded::<Response>();
        let player = Player::new(out_tx);
        info!("player {} connected", player.id());

        thread::spawn(move || {
            let mut stream = writer_stream;
            while let Ok(response) = out_rx.recv() {
                match serde_json::to_string(&response) {
                    Ok(frame) => {
                        if writeln!(stream, "{}", frame).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("response encoding failed: {}", err),
                }
            }
        });

        let events = self.events.clone();
        thread::spawn(move || {
            let reader = BufReader::new(stream);

            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                if line.trim().is_empty() {
                    continue;
                }

                let message: Message = match serde_json::from_str(&line) {
                    Ok(message) => message,
                    Err(err) => {
                        debug!("dropping malformed frame from {}: {}", player.id(), err);
                        continue;
                    }
                };

                match Event::from_wire(message, player.clone()) {
                    Some(event) => {
                        let _ = events.send(event);
                    }
                    None => debug!("dropping malformed payload from {}", player.id()),
                }
            }

            info!("player {} disconnected", player.id());
            let _ = events.send(Event::Disconnected {
                player: player.clone(),
            });
        });
    }
}
