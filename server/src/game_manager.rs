//! Live games, keyed by id.
//!
//! The manager owns every running `Game`, routes move/resign/disconnect
//! traffic into it, and watches each game's Over channel from a small
//! waiter thread that unregisters the game and fans the result out to the
//! surviving sessions. Events naming an unknown game are dropped silently.

use crate::event::Event;
use crate::game::{Game, GameOverReason};
use crate::message::Response;
use crate::player::Player;
use crate::queue_manager::MAX_PLAYERS;
use crate::server::Handler;
use crate::time_control::TimeControl;

use chess::Square;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use uuid::Uuid;

pub struct GameManager {
    games: Arc<Mutex<HashMap<Uuid, Arc<Game>>>>,
}

impl GameManager {
    pub fn new() -> GameManager {
        GameManager {
            games: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn create_game(&self, players: Vec<Player>, time_control: TimeControl) {
        if players.len() != MAX_PLAYERS {
            debug!("refusing to create a game for {} players", players.len());
            return;
        }

        let game = Game::new(players[0].clone(), players[1].clone(), time_control);
        let game_id = game.id();
        self.games.lock().unwrap().insert(game_id, Arc::clone(&game));
        info!("game {} created at {}", game_id, time_control);

        let games = Arc::clone(&self.games);
        let over = game.over();
        thread::spawn(move || {
            if let Ok(result) = over.recv() {
                games.lock().unwrap().remove(&game_id);

                result
                    .winner
                    .send(Response::game_over(result.reason, game_id, true));
                if let Some(loser) = result.loser {
                    loser.send(Response::game_over(result.reason, game_id, false));
                }
            }
        });

        game.start();
    }

    fn move_piece(&self, game_id: Uuid, from: Square, to: Square) {
        let game = match self.find(game_id) {
            Some(game) => game,
            None => {
                debug!("move for unknown game {}", game_id);
                return;
            }
        };

        let transfers = game.move_piece(from, to);
        if transfers.is_empty() {
            return;
        }

        game.end_turn();

        if game.is_checkmate() {
            game.checkmate();
        } else {
            game.start_turn();

            let (player, remaining) = game.current();
            for transfer in &transfers {
                player.send(Response::start_turn(transfer, remaining, game_id));
            }
        }
    }

    fn resign(&self, player: &Player, game_id: Uuid) {
        let game = match self.find(game_id) {
            Some(game) => game,
            None => {
                debug!("resignation for unknown game {}", game_id);
                return;
            }
        };

        if game.involves(player) {
            game.game_over(player, GameOverReason::Resignation);
        }
    }

    fn disconnected(&self, player: &Player) {
        let game = self
            .games
            .lock()
            .unwrap()
            .values()
            .find(|game| game.involves(player))
            .cloned();

        if let Some(game) = game {
            game.game_over(player, GameOverReason::Abandonment);
        }
    }

    fn find(&self, game_id: Uuid) -> Option<Arc<Game>> {
        self.games.lock().unwrap().get(&game_id).cloned()
    }
}

impl Default for GameManager {
    fn default() -> GameManager {
        GameManager::new()
    }
}

impl Handler for GameManager {
    fn process(&self, event: Event) {
        match event {
            Event::CreateGame {
                players,
                time_control,
            } => self.create_game(players, time_control),
            Event::MovePiece { game_id, from, to } => self.move_piece(game_id, from, to),
            Event::Resign { player, game_id } => self.resign(&player, game_id),
            Event::Disconnected { player } => self.disconnected(&player),
            _ => {}
        }
    }
}
