//! The wire vocabulary.
//!
//! Clients speak JSON envelopes `{ "type": ..., "text": ..., "payload": ... }`
//! in both directions. Inbound payloads are type-specific and parsed lazily
//! (a malformed payload drops the whole message, silently); outbound
//! responses are built through the constructors here so every handler
//! produces the same shapes.

use crate::game::GameOverReason;
use crate::time_control::TimeControl;

use chess::{Color, Transfer};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    QueueUp,
    Dequeue,
    MatchConfirmed,
    MatchDeclined,
    MovePiece,
    Resign,
    Disconnected,
}

/// An inbound client message. The payload stays raw JSON until the event
/// conversion knows which shape to expect.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// Payload of a `move_piece` message.
#[derive(Debug, Clone, Deserialize)]
pub struct MovePiece {
    pub from: String,
    pub to: String,
    pub game_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    WaitForMatch,
    ConfirmMatch,
    WaitOtherPlayers,
    MatchCanceled,
    StartGame,
    StartTurn,
    GameOver,
}

/// An outbound server message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ResponsePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    MatchId(Uuid),
    GameStart(GameStart),
    Move(MoveResponse),
    GameOver(GameOverResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStart {
    pub game_id: Uuid,
    pub color: Color,
    pub time_control: TimeControl,
}

/// One atomic square transfer of the move that opened the receiver's turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveResponse {
    pub from: String,
    pub to: String,
    /// Milliseconds remaining on the receiver's clock.
    pub time: u64,
    pub game_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameOverResponse {
    pub reason: GameOverReason,
    pub game_id: Uuid,
    pub winner: bool,
}

impl Response {
    pub fn wait_for_match() -> Response {
        Response {
            kind: ResponseType::WaitForMatch,
            text: Some("wait for match".to_string()),
            payload: None,
        }
    }

    pub fn confirm_match(match_id: Uuid) -> Response {
        Response {
            kind: ResponseType::ConfirmMatch,
            text: None,
            payload: Some(ResponsePayload::MatchId(match_id)),
        }
    }

    pub fn wait_other_players() -> Response {
        Response {
            kind: ResponseType::WaitOtherPlayers,
            text: None,
            payload: None,
        }
    }

    pub fn match_canceled() -> Response {
        Response {
            kind: ResponseType::MatchCanceled,
            text: None,
            payload: None,
        }
    }

    pub fn start_game(game_id: Uuid, color: Color, time_control: TimeControl) -> Response {
        Response {
            kind: ResponseType::StartGame,
            text: None,
            payload: Some(ResponsePayload::GameStart(GameStart {
                game_id,
                color,
                time_control,
            })),
        }
    }

    pub fn start_turn(transfer: &Transfer, remaining: Duration, game_id: Uuid) -> Response {
        Response {
            kind: ResponseType::StartTurn,
            text: None,
            payload: Some(ResponsePayload::Move(MoveResponse {
                from: transfer.from.to_string(),
                to: transfer.to.to_string(),
                time: remaining.as_millis() as u64,
                game_id,
            })),
        }
    }

    pub fn game_over(reason: GameOverReason, game_id: Uuid, winner: bool) -> Response {
        Response {
            kind: ResponseType::GameOver,
            text: None,
            payload: Some(ResponsePayload::GameOver(GameOverResponse {
                reason,
                game_id,
                winner,
            })),
        }
    }
}
