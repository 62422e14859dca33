//! Internal events.
//!
//! Everything on the dispatcher is one of these variants: inbound client
//! messages stamped with their session's `Player`, plus the events the
//! handlers publish among themselves (`MatchFound`, `CreateGame`). Wire
//! messages that fail to convert are dropped without a reply.

use crate::message::{Message, MessageType, MovePiece};
use crate::player::Player;
use crate::time_control::TimeControl;

use chess::Square;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Event {
    QueueUp {
        player: Player,
        time_control: TimeControl,
    },
    Dequeue {
        player: Player,
    },
    MatchConfirmed {
        player: Player,
        match_id: Uuid,
    },
    MatchDeclined {
        player: Player,
        match_id: Uuid,
    },
    MovePiece {
        game_id: Uuid,
        from: Square,
        to: Square,
    },
    Resign {
        player: Player,
        game_id: Uuid,
    },
    /// Posted by the session reader when the socket closes, or sent by the
    /// client itself; both tear the player down the same way.
    Disconnected {
        player: Player,
    },
    /// Published by the queue manager when a queue fills.
    MatchFound {
        players: Vec<Player>,
        time_control: TimeControl,
    },
    /// Published by the matchmaker once every paired player confirms.
    CreateGame {
        players: Vec<Player>,
        time_control: TimeControl,
    },
}

impl Event {
    /// Convert an inbound wire message from `player` into an event.
    /// `None` means the message was malformed in some way; per protocol
    /// those are dropped silently.
    pub fn from_wire(message: Message, player: Player) -> Option<Event> {
        match message.kind {
            MessageType::QueueUp => {
                let time_control: TimeControl = serde_json::from_value(message.payload?).ok()?;
                if time_control.duration.is_zero() {
                    return None;
                }
                Some(Event::QueueUp {
                    player,
                    time_control,
                })
            }
            MessageType::Dequeue => Some(Event::Dequeue { player }),
            MessageType::MatchConfirmed => Some(Event::MatchConfirmed {
                player,
                match_id: parse_id(message.payload?)?,
            }),
            MessageType::MatchDeclined => Some(Event::MatchDeclined {
                player,
                match_id: parse_id(message.payload?)?,
            }),
            MessageType::MovePiece => {
                let mv: MovePiece = serde_json::from_value(message.payload?).ok()?;
                Some(Event::MovePiece {
                    game_id: mv.game_id,
                    from: mv.from.parse().ok()?,
                    to: mv.to.parse().ok()?,
                })
            }
            MessageType::Resign => Some(Event::Resign {
                player,
                game_id: parse_id(message.payload?)?,
            }),
            MessageType::Disconnected => Some(Event::Disconnected { player }),
        }
    }
}

fn parse_id(payload: serde_json::Value) -> Option<Uuid> {
    serde_json::from_value(payload).ok()
}
