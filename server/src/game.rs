//! A running match: two player slots in a fixed rotation, a shared board,
//! and the countdown clocks.
//!
//! Clock bookkeeping lives on the slots (remaining time plus the instant
//! the running clock started); expiry detection lives in one watchdog
//! thread per game, which selects on a control channel and a single-shot
//! `after` deadline for whichever clock is running. Stopping a clock
//! credits the increment. Exactly one terminal transition publishes on the
//! Over channel; everything after that is a no-op.

use crate::message::Response;
use crate::player::Player;
use crate::time_control::TimeControl;

use chess::{Board, Color, Square, Transfer};
use crossbeam_channel::{after, bounded, select, unbounded, Receiver, Sender};
use log::{debug, info};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Why a game ended. Serialized verbatim into the game-over response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameOverReason {
    Checkmate,
    Timeout,
    Resignation,
    Abandonment,
}

/// The outcome published on a game's Over channel. An abandonment carries
/// no loser: there is no session left to notify.
#[derive(Debug, Clone)]
pub struct GameResult {
    pub winner: Player,
    pub loser: Option<Player>,
    pub reason: GameOverReason,
}

/// One side of a game: the session handle, the color, where its king is,
/// and its clock.
struct GamePlayer {
    player: Player,
    color: Color,
    king: Square,
    remaining: Duration,
    started: Option<Instant>,
}

impl GamePlayer {
    fn new(player: Player, color: Color, time_control: TimeControl) -> GamePlayer {
        GamePlayer {
            player,
            color,
            king: Square::new(color.home_rank(), 4),
            remaining: time_control.duration,
            started: None,
        }
    }
}

enum ClockCmd {
    /// The given slot's clock is running with this much time left.
    Run { slot: usize, remaining: Duration },
    /// No clock is running.
    Pause,
}

struct Inner {
    players: [GamePlayer; 2],
    current: usize,
    time_control: TimeControl,
    over_tx: Option<Sender<GameResult>>,
    clock_tx: Option<Sender<ClockCmd>>,
}

pub struct Game {
    id: Uuid,
    board: Board,
    inner: Mutex<Inner>,
    over_rx: Receiver<GameResult>,
}

impl Game {
    /// Build a game with both clocks created stopped at the time-control
    /// duration and spawn its clock watchdog. `white` moves first.
    pub fn new(white: Player, black: Player, time_control: TimeControl) -> Arc<Game> {
        let (over_tx, over_rx) = bounded(1);
        let (clock_tx, clock_rx) = unbounded();

        let game = Arc::new(Game {
            id: Uuid::new_v4(),
            board: Board::new(),
            inner: Mutex::new(Inner {
                players: [
                    GamePlayer::new(white, Color::White, time_control),
                    GamePlayer::new(black, Color::Black, time_control),
                ],
                current: 0,
                time_control,
                over_tx: Some(over_tx),
                clock_tx: Some(clock_tx),
            }),
            over_rx,
        });

        let watchdog = Arc::clone(&game);
        thread::spawn(move || watchdog.run_clock(clock_rx));

        game
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The channel the terminal result is published on.
    pub fn over(&self) -> Receiver<GameResult> {
        self.over_rx.clone()
    }

    pub fn involves(&self, player: &Player) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.players.iter().any(|slot| slot.player == *player)
    }

    /// Announce the game to both players and start white's clock.
    pub fn start(&self) {
        let mut inner = self.inner.lock().unwrap();

        for slot in &inner.players {
            slot.player
                .send(Response::start_game(self.id, slot.color, inner.time_control));
        }

        self.start_clock(&mut inner);
    }

    /// Apply a move for the side to move. Returns the empty vec when
    /// `from` does not hold the mover's piece or the move is illegal; the
    /// caller must not advance the turn in that case.
    pub fn move_piece(&self, from: Square, to: Square) -> Vec<Transfer> {
        let mut inner = self.inner.lock().unwrap();

        let piece = self.board.piece_at(from);
        let current = inner.current;
        if piece.is_empty() || piece.color() != inner.players[current].color {
            return Vec::new();
        }

        let transfers = self.board.move_piece(from, to);

        if piece.is_king() {
            if let Some(own) = transfers.iter().find(|t| t.from == from) {
                inner.players[current].king = own.to;
            }
        }

        if !transfers.is_empty() {
            debug!("game {} position:\n{}", self.id, self.board);
        }

        transfers
    }

    /// Stop the mover's clock (crediting the increment) and pass the turn.
    pub fn end_turn(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.stop_clock(&mut inner);
        inner.current = 1 - inner.current;
    }

    /// Start the new side's clock.
    pub fn start_turn(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.start_clock(&mut inner);
    }

    /// The side to move and the time left on their clock.
    pub fn current(&self) -> (Player, Duration) {
        let inner = self.inner.lock().unwrap();
        let slot = &inner.players[inner.current];
        (slot.player.clone(), slot.remaining)
    }

    /// Checkmate test against the side to move: their king is threatened,
    /// has nowhere safe to go, and no friendly piece can block.
    pub fn is_checkmate(&self) -> bool {
        let (king_square, color) = {
            let inner = self.inner.lock().unwrap();
            let slot = &inner.players[inner.current];
            (slot.king, slot.color)
        };

        let threats = self.board.is_threatened(king_square, color);
        if threats.is_empty() {
            return false;
        }

        let king = self.board.piece_at(king_square);
        !king.has_moves(king_square, &self.board) && !self.board.can_block(&threats, color)
    }

    /// Stop both clocks and end the game against the side to move.
    pub fn checkmate(&self) {
        let loser = {
            let inner = self.inner.lock().unwrap();
            inner.players[inner.current].player.clone()
        };

        self.game_over(&loser, GameOverReason::Checkmate);
    }

    /// The single terminal transition: compute the winner as the other
    /// side, stop the clocks, and publish the result. Only the first call
    /// does anything. An abandonment loser is dropped from the result so
    /// nothing is sent to the dead session.
    pub fn game_over(&self, loser: &Player, reason: GameOverReason) {
        let mut inner = self.inner.lock().unwrap();

        let over_tx = match inner.over_tx.take() {
            Some(tx) => tx,
            None => return,
        };

        for slot in &mut inner.players {
            slot.started = None;
        }
        // Dropping the control channel retires the watchdog.
        inner.clock_tx = None;

        let current = &inner.players[inner.current];
        let winner = if current.player == *loser {
            inner.players[1 - inner.current].player.clone()
        } else {
            current.player.clone()
        };

        let loser = if reason == GameOverReason::Abandonment {
            None
        } else {
            Some(loser.clone())
        };

        info!("game {} over: {:?}", self.id, reason);
        let _ = over_tx.send(GameResult {
            winner,
            loser,
            reason,
        });
    }

    fn start_clock(&self, inner: &mut Inner) {
        let current = inner.current;
        let slot = &mut inner.players[current];
        slot.started = Some(Instant::now());

        let remaining = slot.remaining;
        if let Some(tx) = &inner.clock_tx {
            let _ = tx.send(ClockCmd::Run {
                slot: current,
                remaining,
            });
        }
    }

    fn stop_clock(&self, inner: &mut Inner) {
        let increment = inner.time_control.increment;
        let current = inner.current;
        let slot = &mut inner.players[current];

        if let Some(started) = slot.started.take() {
            slot.remaining = slot.remaining.saturating_sub(started.elapsed()) + increment;
        }

        if let Some(tx) = &inner.clock_tx {
            let _ = tx.send(ClockCmd::Pause);
        }
    }

    /// The per-game timekeeper. At most one clock runs at a time, so a
    /// single deadline receiver covers both: rearming replaces it, pausing
    /// discards it, and expiry is the running side's flag fall.
    fn run_clock(self: Arc<Game>, rx: Receiver<ClockCmd>) {
        let mut armed: Option<(usize, Receiver<Instant>)> = None;

        loop {
            match armed.take() {
                Some((slot, deadline)) => {
                    select! {
                        recv(rx) -> cmd => match cmd {
                            Ok(ClockCmd::Run { slot, remaining }) => {
                                armed = Some((slot, after(remaining)));
                            }
                            Ok(ClockCmd::Pause) => {}
                            Err(_) => break,
                        },
                        recv(deadline) -> _ => {
                            let loser = {
                                let inner = self.inner.lock().unwrap();
                                inner.players[slot].player.clone()
                            };
                            self.game_over(&loser, GameOverReason::Timeout);
                            break;
                        }
                    }
                }
                None => match rx.recv() {
                    Ok(ClockCmd::Run { slot, remaining }) => {
                        armed = Some((slot, after(remaining)));
                    }
                    Ok(ClockCmd::Pause) => {}
                    Err(_) => break,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Response, ResponsePayload, ResponseType};
    use crossbeam_channel::Receiver as ResponseReceiver;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn control(duration: Duration, increment: Duration) -> TimeControl {
        TimeControl::new(duration, increment)
    }

    fn game_with(
        tc: TimeControl,
    ) -> (
        Arc<Game>,
        ResponseReceiver<Response>,
        ResponseReceiver<Response>,
    ) {
        let (white, white_rx) = Player::pair();
        let (black, black_rx) = Player::pair();
        (Game::new(white, black, tc), white_rx, black_rx)
    }

    /// Drive one full turn the way the game manager does.
    fn turn(game: &Game, from: &str, to: &str) {
        let transfers = game.move_piece(sq(from), sq(to));
        assert!(!transfers.is_empty(), "move {}{} was rejected", from, to);
        game.end_turn();
        if !game.is_checkmate() {
            game.start_turn();
        }
    }

    #[test]
    fn start_announces_colors_and_control() {
        let tc = control(Duration::from_secs(300), Duration::ZERO);
        let (game, white_rx, black_rx) = game_with(tc);
        game.start();

        let white = white_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(white.kind, ResponseType::StartGame);
        match white.payload {
            Some(ResponsePayload::GameStart(start)) => {
                assert_eq!(start.game_id, game.id());
                assert_eq!(start.color, Color::White);
                assert_eq!(start.time_control, tc);
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        let black = black_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        match black.payload {
            Some(ResponsePayload::GameStart(start)) => assert_eq!(start.color, Color::Black),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn only_the_side_to_move_may_move() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(300), Duration::ZERO));

        // Black tries to move first.
        assert!(game.move_piece(sq("e7"), sq("e5")).is_empty());
        // Moving from an empty square does nothing either.
        assert!(game.move_piece(sq("e4"), sq("e5")).is_empty());

        assert_eq!(game.move_piece(sq("e2"), sq("e4")).len(), 1);
    }

    #[test]
    fn end_turn_passes_the_move() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(300), Duration::ZERO));

        assert_eq!(game.move_piece(sq("e2"), sq("e4")).len(), 1);
        game.end_turn();

        // Now black may move and white may not.
        assert!(game.move_piece(sq("d2"), sq("d4")).is_empty());
        assert_eq!(game.move_piece(sq("e7"), sq("e5")).len(), 1);
    }

    #[test]
    fn stopping_a_clock_credits_the_increment() {
        let tc = control(Duration::from_secs(1), Duration::from_millis(200));
        let (game, _wrx, _brx) = game_with(tc);

        game.start();
        let (white, before) = game.current();
        assert_eq!(before, Duration::from_secs(1));

        thread::sleep(Duration::from_millis(100));
        assert_eq!(game.move_piece(sq("e2"), sq("e4")).len(), 1);
        game.end_turn();
        game.start_turn();

        // White spent at least 100ms and earned 200ms back.
        let inner = game.inner.lock().unwrap();
        let slot = inner
            .players
            .iter()
            .find(|s| s.player == white)
            .expect("white slot");
        assert!(slot.remaining <= Duration::from_millis(1100));
        assert!(slot.remaining > Duration::from_millis(900));
    }

    #[test]
    fn running_out_of_time_loses() {
        let tc = control(Duration::from_millis(40), Duration::ZERO);
        let (game, _wrx, _brx) = game_with(tc);
        let over = game.over();

        game.start();

        let result = over.recv_timeout(Duration::from_secs(2)).expect("no result");
        assert_eq!(result.reason, GameOverReason::Timeout);

        let (_, black) = {
            let inner = game.inner.lock().unwrap();
            (
                inner.players[0].player.clone(),
                inner.players[1].player.clone(),
            )
        };
        assert_eq!(result.winner, black);
    }

    #[test]
    fn the_over_channel_fires_at_most_once() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(300), Duration::ZERO));
        let over = game.over();

        let (loser, _) = game.current();
        game.game_over(&loser, GameOverReason::Resignation);
        game.game_over(&loser, GameOverReason::Resignation);
        game.checkmate();

        assert!(over.recv_timeout(Duration::from_secs(1)).is_ok());
        assert!(over.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn abandonment_has_no_loser_to_notify() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(300), Duration::ZERO));
        let over = game.over();

        let (white, _) = game.current();
        game.game_over(&white, GameOverReason::Abandonment);

        let result = over.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result.reason, GameOverReason::Abandonment);
        assert!(result.loser.is_none());
        assert_ne!(result.winner, white);
    }

    #[test]
    fn fools_mate_ends_in_checkmate() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(5), Duration::ZERO));
        game.start();

        turn(&game, "f2", "f3");
        turn(&game, "e7", "e5");
        turn(&game, "g2", "g4");

        let transfers = game.move_piece(sq("d8"), sq("h4"));
        assert_eq!(transfers.len(), 1);
        game.end_turn();

        assert!(game.is_checkmate());
        game.checkmate();

        let result = game.over().recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result.reason, GameOverReason::Checkmate);

        let (white, black) = {
            let inner = game.inner.lock().unwrap();
            (
                inner.players[0].player.clone(),
                inner.players[1].player.clone(),
            )
        };
        assert_eq!(result.winner, black);
        assert_eq!(result.loser, Some(white));
    }

    #[test]
    fn blockable_check_is_not_over() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(5), Duration::ZERO));
        game.start();

        turn(&game, "e2", "e4");
        turn(&game, "e7", "e6");
        turn(&game, "b2", "b3");
        turn(&game, "d8", "h4");
        turn(&game, "h2", "h3");

        let transfers = game.move_piece(sq("h4"), sq("e4"));
        assert_eq!(transfers.len(), 1);
        game.end_turn();

        // White is in check but can interpose on e2 or e3.
        assert!(!game.is_checkmate());
    }

    #[test]
    fn king_square_tracks_a_castle() {
        let (game, _wrx, _brx) = game_with(control(Duration::from_secs(300), Duration::ZERO));

        turn(&game, "g2", "g3");
        turn(&game, "a7", "a6");
        turn(&game, "f1", "g2");
        turn(&game, "b7", "b6");
        turn(&game, "g1", "f3");
        turn(&game, "c7", "c6");

        let transfers = game.move_piece(sq("e1"), sq("g1"));
        assert_eq!(transfers.len(), 2);

        let inner = game.inner.lock().unwrap();
        assert_eq!(inner.players[0].king, sq("g1"));
    }
}
