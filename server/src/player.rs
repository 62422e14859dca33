//! Player session handles.
//!
//! A `Player` is the cheap, clonable identity other components hold: the
//! session id plus the sending half of the session's outbound channel. The
//! threads that own the socket live in the server module; when they are
//! gone, sends simply drop. Nothing ever dereferences a dead session.

use crate::message::Response;

use crossbeam_channel::Sender;
use log::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Player {
    id: Uuid,
    outgoing: Sender<Response>,
}

impl Player {
    pub fn new(outgoing: Sender<Response>) -> Player {
        Player {
            id: Uuid::new_v4(),
            outgoing,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a response for the session's writer. A torn-down session
    /// swallows the response.
    pub fn send(&self, response: Response) {
        if self.outgoing.send(response).is_err() {
            debug!("dropping response to departed player {}", self.id);
        }
    }

    /// A detached player plus the receiving end of its outbox, for tests.
    #[cfg(test)]
    pub(crate) fn pair() -> (Player, crossbeam_channel::Receiver<Response>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Player::new(tx), rx)
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Player) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_the_id() {
        let (a, _rx_a) = Player::pair();
        let (b, _rx_b) = Player::pair();

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn send_to_departed_session_is_a_noop() {
        let (player, rx) = Player::pair();
        drop(rx);

        // Must neither panic nor block.
        player.send(Response::wait_for_match());
    }
}
