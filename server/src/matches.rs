//! A pending pairing awaiting confirmation from both players.

use crate::message::Response;
use crate::player::Player;
use crate::time_control::TimeControl;

use crossbeam_channel::{after, bounded, select, unbounded, Receiver, Sender};
use std::time::Duration;
use uuid::Uuid;

/// How a confirmation window ended.
#[derive(Debug)]
pub enum Outcome {
    /// Every paired player confirmed, in confirmation order.
    Ready(Vec<Player>),
    /// Timed out, declined, or a player disconnected. Carries only the
    /// players who had confirmed; they get requeued, the rest are dropped.
    Canceled(Vec<Player>),
}

pub struct Match {
    id: Uuid,
    players: Vec<Player>,
    time_control: TimeControl,
    confirm_tx: Sender<Player>,
    confirm_rx: Receiver<Player>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
}

impl Match {
    pub fn new(players: Vec<Player>, time_control: TimeControl) -> Match {
        let (confirm_tx, confirm_rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded(1);

        Match {
            id: Uuid::new_v4(),
            players,
            time_control,
            confirm_tx,
            confirm_rx,
            cancel_tx,
            cancel_rx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn time_control(&self) -> TimeControl {
        self.time_control
    }

    pub fn involves(&self, player: &Player) -> bool {
        self.players.contains(player)
    }

    /// Ask every paired player to confirm.
    pub fn ask_confirmation(&self) {
        for player in &self.players {
            player.send(Response::confirm_match(self.id));
        }
    }

    /// Record a confirmation. Players outside the pairing are ignored.
    pub fn confirm(&self, player: Player) {
        if !self.involves(&player) {
            return;
        }

        player.send(Response::wait_other_players());
        let _ = self.confirm_tx.send(player);
    }

    /// Cancel the pairing (a decline or a disconnect).
    pub fn cancel(&self) {
        let _ = self.cancel_tx.try_send(());
    }

    /// Block until every player confirms, the window elapses, or the
    /// match is canceled. Duplicate confirmations count once.
    pub fn wait_confirmation(&self, timeout: Duration) -> Outcome {
        let deadline = after(timeout);
        let confirm_rx = &self.confirm_rx;
        let cancel_rx = &self.cancel_rx;
        let mut confirmed: Vec<Player> = Vec::new();

        loop {
            select! {
                recv(confirm_rx) -> player => {
                    let player = match player {
                        Ok(player) => player,
                        Err(_) => return Outcome::Canceled(confirmed),
                    };

                    if confirmed.contains(&player) {
                        continue;
                    }

                    confirmed.push(player);
                    if confirmed.len() == self.players.len() {
                        return Outcome::Ready(confirmed);
                    }
                }
                recv(cancel_rx) -> _ => return Outcome::Canceled(confirmed),
                recv(deadline) -> _ => return Outcome::Canceled(confirmed),
            }
        }
    }
}
