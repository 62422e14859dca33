use clap::Parser;
use log::{error, LevelFilter};
use server::{EventBus, GameManager, Handler, MatchMaker, QueueManager, Server};
use simple_logger::SimpleLogger;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[clap(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Confirmation window for a proposed match
    #[clap(long, default_value = "10s", parse(try_from_str = humantime::parse_duration))]
    match_timeout: Duration,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,
}

pub fn run() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("logger init failed");

    let bus = EventBus::new();
    let handlers: Vec<Arc<dyn Handler>> = vec![
        Arc::new(QueueManager::new(bus.sender())),
        Arc::new(MatchMaker::new(bus.sender(), args.match_timeout)),
        Arc::new(GameManager::new()),
    ];

    let server = Server::new(bus, handlers);
    if let Err(err) = server.listen(&args.bind) {
        error!("server exited: {}", err);
        std::process::exit(1);
    }
}
