//! Matchmaking queues, one per time control.

use crate::event::Event;
use crate::message::Response;
use crate::player::Player;
use crate::queue::Queue;
use crate::server::Handler;
use crate::time_control::TimeControl;

use crossbeam_channel::Sender;
use log::info;
use std::collections::HashMap;
use std::sync::Mutex;

/// Players per match.
pub const MAX_PLAYERS: usize = 2;

/// Routes queueing traffic into per-time-control queues, lazily created,
/// and announces a `MatchFound` whenever one fills.
pub struct QueueManager {
    events: Sender<Event>,
    queues: Mutex<HashMap<TimeControl, Queue>>,
}

impl QueueManager {
    pub fn new(events: Sender<Event>) -> QueueManager {
        QueueManager {
            events,
            queues: Mutex::new(HashMap::new()),
        }
    }

    fn queue_up(&self, player: Player, time_control: TimeControl) {
        let mut queues = self.queues.lock().unwrap();
        let queue = queues.entry(time_control).or_default();

        queue.push(player.clone());
        player.send(Response::wait_for_match());

        if queue.len() == MAX_PLAYERS {
            let players: Vec<Player> = std::iter::from_fn(|| queue.pop())
                .take(MAX_PLAYERS)
                .collect();

            info!("queue {} filled, proposing a match", time_control);
            let _ = self.events.send(Event::MatchFound {
                players,
                time_control,
            });
        }
    }

    fn remove(&self, player: &Player) {
        for queue in self.queues.lock().unwrap().values() {
            queue.remove(player);
        }
    }
}

impl Handler for QueueManager {
    fn process(&self, event: Event) {
        match event {
            Event::QueueUp {
                player,
                time_control,
            } => self.queue_up(player, time_control),
            Event::Dequeue { player } | Event::Disconnected { player } => self.remove(&player),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ResponseType;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn control(secs: u64) -> TimeControl {
        TimeControl::new(Duration::from_secs(secs), Duration::ZERO)
    }

    #[test]
    fn queueing_up_acknowledges_and_waits() {
        let (tx, rx) = unbounded();
        let manager = QueueManager::new(tx);
        let (player, responses) = Player::pair();

        manager.process(Event::QueueUp {
            player,
            time_control: control(300),
        });

        assert_eq!(responses.try_recv().unwrap().kind, ResponseType::WaitForMatch);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn a_full_queue_proposes_a_match() {
        let (tx, rx) = unbounded();
        let manager = QueueManager::new(tx);
        let (a, _ra) = Player::pair();
        let (b, _rb) = Player::pair();

        manager.process(Event::QueueUp {
            player: a.clone(),
            time_control: control(300),
        });
        manager.process(Event::QueueUp {
            player: b.clone(),
            time_control: control(300),
        });

        match rx.try_recv().unwrap() {
            Event::MatchFound {
                players,
                time_control,
            } => {
                assert_eq!(players, vec![a, b]);
                assert_eq!(time_control, control(300));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn different_controls_queue_separately() {
        let (tx, rx) = unbounded();
        let manager = QueueManager::new(tx);
        let (a, _ra) = Player::pair();
        let (b, _rb) = Player::pair();

        manager.process(Event::QueueUp {
            player: a,
            time_control: control(300),
        });
        manager.process(Event::QueueUp {
            player: b,
            time_control: control(600),
        });

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dequeue_empties_every_queue() {
        let (tx, rx) = unbounded();
        let manager = QueueManager::new(tx);
        let (a, _ra) = Player::pair();
        let (b, _rb) = Player::pair();

        manager.process(Event::QueueUp {
            player: a.clone(),
            time_control: control(300),
        });
        manager.process(Event::QueueUp {
            player: a.clone(),
            time_control: control(600),
        });
        manager.process(Event::Dequeue { player: a });

        // Nobody is waiting anymore, so b's arrival fills nothing.
        manager.process(Event::QueueUp {
            player: b,
            time_control: control(300),
        });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disconnect_removes_like_dequeue() {
        let (tx, rx) = unbounded();
        let manager = QueueManager::new(tx);
        let (a, _ra) = Player::pair();
        let (b, _rb) = Player::pair();

        manager.process(Event::QueueUp {
            player: a.clone(),
            time_control: control(300),
        });
        manager.process(Event::Disconnected { player: a });
        manager.process(Event::QueueUp {
            player: b,
            time_control: control(300),
        });

        assert!(rx.try_recv().is_err());
    }
}
