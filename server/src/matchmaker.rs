//! Pending matches and their confirmation windows.

use crate::event::Event;
use crate::matches::{Match, Outcome};
use crate::message::Response;
use crate::player::Player;
use crate::server::Handler;
use crate::time_control::TimeControl;

use crossbeam_channel::Sender;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

pub struct MatchMaker {
    events: Sender<Event>,
    timeout: Duration,
    matches: Arc<Mutex<HashMap<Uuid, Arc<Match>>>>,
}

impl MatchMaker {
    pub fn new(events: Sender<Event>, timeout: Duration) -> MatchMaker {
        MatchMaker {
            events,
            timeout,
            matches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Propose a pairing: ask both players to confirm and spawn the
    /// bounded wait that decides its fate.
    fn create_match(&self, players: Vec<Player>, time_control: TimeControl) {
        let m = Arc::new(Match::new(players, time_control));
        self.matches.lock().unwrap().insert(m.id(), Arc::clone(&m));

        info!("proposed match {} at {}", m.id(), time_control);
        m.ask_confirmation();

        let matches = Arc::clone(&self.matches);
        let events = self.events.clone();
        let timeout = self.timeout;

        thread::spawn(move || {
            let outcome = m.wait_confirmation(timeout);
            matches.lock().unwrap().remove(&m.id());

            match outcome {
                Outcome::Ready(players) => {
                    info!("match {} confirmed by both players", m.id());
                    let _ = events.send(Event::CreateGame {
                        players,
                        time_control: m.time_control(),
                    });
                }
                Outcome::Canceled(confirmed) => {
                    info!(
                        "match {} canceled, requeueing {} confirmed player(s)",
                        m.id(),
                        confirmed.len()
                    );

                    for player in m.players() {
                        player.send(Response::match_canceled());
                    }

                    for player in confirmed {
                        let _ = events.send(Event::QueueUp {
                            player,
                            time_control: m.time_control(),
                        });
                    }
                }
            }
        });
    }

    fn confirm(&self, match_id: Uuid, player: Player) {
        match self.find(match_id) {
            Some(m) => m.confirm(player),
            None => debug!("confirmation for unknown match {}", match_id),
        }
    }

    fn cancel(&self, match_id: Uuid) {
        match self.find(match_id) {
            Some(m) => m.cancel(),
            None => debug!("decline for unknown match {}", match_id),
        }
    }

    /// Cancel every pending match that references `player`.
    fn cancel_for(&self, player: &Player) {
        let involved: Vec<Arc<Match>> = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.involves(player))
            .cloned()
            .collect();

        for m in involved {
            m.cancel();
        }
    }

    fn find(&self, match_id: Uuid) -> Option<Arc<Match>> {
        self.matches.lock().unwrap().get(&match_id).cloned()
    }

    #[cfg(test)]
    fn has_matches(&self) -> bool {
        !self.matches.lock().unwrap().is_empty()
    }
}

impl Handler for MatchMaker {
    fn process(&self, event: Event) {
        match event {
            Event::MatchFound {
                players,
                time_control,
            } => self.create_match(players, time_control),
            Event::MatchConfirmed { player, match_id } => self.confirm(match_id, player),
            Event::MatchDeclined { match_id, .. } => self.cancel(match_id),
            Event::Disconnected { player } => self.cancel_for(&player),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ResponsePayload, ResponseType};
    use crossbeam_channel::{unbounded, Receiver};

    fn control(secs: u64) -> TimeControl {
        TimeControl::new(Duration::from_secs(secs), Duration::ZERO)
    }

    fn proposed_id(responses: &Receiver<Response>) -> Uuid {
        let response = responses
            .recv_timeout(Duration::from_secs(1))
            .expect("no confirmation request");
        assert_eq!(response.kind, ResponseType::ConfirmMatch);
        match response.payload {
            Some(ResponsePayload::MatchId(id)) => id,
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn match_found_asks_both_players() {
        let (tx, _rx) = unbounded();
        let maker = MatchMaker::new(tx, Duration::from_millis(100));
        let (a, ra) = Player::pair();
        let (b, rb) = Player::pair();

        maker.process(Event::MatchFound {
            players: vec![a, b],
            time_control: control(300),
        });

        let id = proposed_id(&ra);
        assert_eq!(proposed_id(&rb), id);
        assert!(maker.has_matches());
    }

    #[test]
    fn both_confirmations_create_the_game() {
        let (tx, rx) = unbounded();
        let maker = MatchMaker::new(tx, Duration::from_secs(5));
        let (a, ra) = Player::pair();
        let (b, rb) = Player::pair();

        maker.process(Event::MatchFound {
            players: vec![a.clone(), b.clone()],
            time_control: control(300),
        });
        let id = proposed_id(&ra);
        proposed_id(&rb);

        maker.process(Event::MatchConfirmed {
            player: a.clone(),
            match_id: id,
        });
        maker.process(Event::MatchConfirmed {
            player: b.clone(),
            match_id: id,
        });

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            Event::CreateGame {
                players,
                time_control,
            } => {
                assert_eq!(players.len(), 2);
                assert!(players.contains(&a) && players.contains(&b));
                assert_eq!(time_control, control(300));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn timeout_requeues_only_the_confirmed_player() {
        let (tx, rx) = unbounded();
        let maker = MatchMaker::new(tx, Duration::from_millis(100));
        let (a, ra) = Player::pair();
        let (b, rb) = Player::pair();

        maker.process(Event::MatchFound {
            players: vec![a.clone(), b.clone()],
            time_control: control(600),
        });
        let id = proposed_id(&ra);
        proposed_id(&rb);

        maker.process(Event::MatchConfirmed {
            player: a.clone(),
            match_id: id,
        });

        // Player a rejoins the ten-minute queue automatically.
        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            Event::QueueUp {
                player,
                time_control,
            } => {
                assert_eq!(player, a);
                assert_eq!(time_control, control(600));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // Player b was dropped: canceled, but never requeued.
        assert!(rx.try_recv().is_err());
        let canceled: Vec<ResponseType> = rb.try_iter().map(|r| r.kind).collect();
        assert!(canceled.contains(&ResponseType::MatchCanceled));
    }

    #[test]
    fn decline_cancels_the_match() {
        let (tx, rx) = unbounded();
        let maker = MatchMaker::new(tx, Duration::from_secs(5));
        let (a, ra) = Player::pair();
        let (b, rb) = Player::pair();

        maker.process(Event::MatchFound {
            players: vec![a.clone(), b],
            time_control: control(300),
        });
        let id = proposed_id(&ra);
        proposed_id(&rb);

        maker.process(Event::MatchDeclined {
            player: a,
            match_id: id,
        });

        let canceled = ra.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(canceled.kind, ResponseType::MatchCanceled);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disconnect_cancels_any_match_with_the_player() {
        let (tx, _rx) = unbounded();
        let maker = MatchMaker::new(tx, Duration::from_secs(5));
        let (a, _ra) = Player::pair();
        let (b, rb) = Player::pair();

        maker.process(Event::MatchFound {
            players: vec![a.clone(), b],
            time_control: control(300),
        });

        maker.process(Event::Disconnected { player: a });

        // The confirmation request may still be in flight; the cancellation
        // must follow it.
        loop {
            let response = rb
                .recv_timeout(Duration::from_secs(1))
                .expect("cancellation never arrived");
            if response.kind == ResponseType::MatchCanceled {
                break;
            }
        }

        // The pending match is gone once the wait thread settles.
        let deadline = std::time::Instant::now() + Duration::from_secs(1);
        while maker.has_matches() {
            assert!(std::time::Instant::now() < deadline, "match never settled");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn unknown_match_ids_are_dropped() {
        let (tx, rx) = unbounded();
        let maker = MatchMaker::new(tx, Duration::from_secs(5));
        let (a, _ra) = Player::pair();

        maker.process(Event::MatchConfirmed {
            player: a.clone(),
            match_id: Uuid::new_v4(),
        });
        maker.process(Event::MatchDeclined {
            player: a,
            match_id: Uuid::new_v4(),
        });

        assert!(rx.try_recv().is_err());
    }
}
