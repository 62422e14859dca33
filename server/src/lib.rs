//! Session lifecycle engine for real-time chess matches.
//!
//! Clients connect over a persistent socket and flow one way through the
//! pipeline: queueing, match proposal and confirmation, game creation,
//! move arbitration, termination. Components never call each other; they
//! coordinate exclusively by publishing events on the injected bus, each
//! consuming them on its own serialized handler loop.

pub mod event;
pub mod game;
pub mod game_manager;
pub mod matches;
pub mod matchmaker;
pub mod message;
pub mod player;
pub mod queue;
pub mod queue_manager;
pub mod server;
pub mod time_control;

pub use event::Event;
pub use game::{Game, GameOverReason, GameResult};
pub use game_manager::GameManager;
pub use matches::Match;
pub use matchmaker::MatchMaker;
pub use message::{Message, Response};
pub use player::Player;
pub use queue::Queue;
pub use queue_manager::QueueManager;
pub use server::{EventBus, Handler, Server};
pub use time_control::TimeControl;
