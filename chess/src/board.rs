//! The board: an 8×8 grid of pieces behind a mutex, with the threat,
//! blocking and castling-rights machinery the game layer builds on.
//!
//! Every cell always holds a `Piece`; `Piece::empty()` is a value, not a
//! null. Invalid move requests are a no-op returning no transfers, never
//! an error.

use crate::movement::Transfer;
use crate::piece::{Color, Piece};
use crate::square::{Range, Square};

use bitflags::bitflags;
use log::debug;
use std::fmt;
use std::sync::Mutex;

bitflags! {
    /// Which castles are still available. A right is lost as soon as any
    /// piece moves off the corresponding king or rook origin square.
    pub struct CastlingRights: u8 {
        const WHITE_KINGSIDE  = 0b0001;
        const WHITE_QUEENSIDE = 0b0010;
        const BLACK_KINGSIDE  = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRights {
    pub fn allows(self, color: Color, kingside: bool) -> bool {
        let wing = match (color, kingside) {
            (Color::White, true) => CastlingRights::WHITE_KINGSIDE,
            (Color::White, false) => CastlingRights::WHITE_QUEENSIDE,
            (Color::Black, true) => CastlingRights::BLACK_KINGSIDE,
            (Color::Black, false) => CastlingRights::BLACK_QUEENSIDE,
        };
        self.contains(wing)
    }

    /// The rights forfeited by a move leaving `square`.
    fn lost_from(square: Square) -> CastlingRights {
        match (square.rank(), square.file()) {
            (0, 4) => CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE,
            (0, 7) => CastlingRights::WHITE_KINGSIDE,
            (0, 0) => CastlingRights::WHITE_QUEENSIDE,
            (7, 4) => CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE,
            (7, 7) => CastlingRights::BLACK_KINGSIDE,
            (7, 0) => CastlingRights::BLACK_QUEENSIDE,
            _ => CastlingRights::empty(),
        }
    }
}

struct Inner {
    grid: [[Piece; 8]; 8],
    rights: CastlingRights,
}

/// The playing surface of one game.
pub struct Board {
    inner: Mutex<Inner>,
}

impl Board {
    /// A board in the standard initial position, all castles available.
    pub fn new() -> Board {
        let mut grid: [[Piece; 8]; 8] =
            std::array::from_fn(|_| std::array::from_fn(|_| Piece::empty()));

        for (file, piece) in back_rank(Color::White).into_iter().enumerate() {
            grid[0][file] = piece;
        }
        for (file, piece) in back_rank(Color::Black).into_iter().enumerate() {
            grid[7][file] = piece;
        }
        for file in 0..8 {
            grid[1][file] = Piece::pawn(Color::White);
            grid[6][file] = Piece::pawn(Color::Black);
        }

        Board {
            inner: Mutex::new(Inner {
                grid,
                rights: CastlingRights::all(),
            }),
        }
    }

    pub fn piece_at(&self, square: Square) -> Piece {
        let inner = self.inner.lock().unwrap();
        inner.grid[square.rank() as usize][square.file() as usize].clone()
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.inner.lock().unwrap().rights
    }

    /// Validate the requested move and, when legal, apply its atomic
    /// transfers under the board mutex. Returns the transfers applied;
    /// an illegal or nonsensical request returns the empty vec and
    /// changes nothing.
    pub fn move_piece(&self, from: Square, to: Square) -> Vec<Transfer> {
        let piece = self.piece_at(from);
        if piece.is_empty() {
            return Vec::new();
        }

        let transfers = piece.moves(from, to, self);
        if transfers.is_empty() {
            debug!("rejected move {}{}", from, to);
            return transfers;
        }

        self.apply(&transfers);
        transfers
    }

    /// Every threat against `square` held by the opponents of `color`:
    /// one `Range` per threatening piece, running from the threatener to
    /// the square.
    pub fn is_threatened(&self, square: Square, color: Color) -> Vec<Range> {
        self.threats_ignoring(square, color, None)
    }

    /// Threat scan with one square treated as empty. Used for king moves:
    /// scanning the king's destination with the king lifted off `ignore`
    /// keeps it from shielding the destination on its own line.
    pub fn threats_ignoring(
        &self,
        square: Square,
        color: Color,
        ignore: Option<Square>,
    ) -> Vec<Range> {
        let scan = self.snapshot(ignore);
        let mut threats = Vec::new();

        for from in Square::all() {
            let piece = scan.piece_at(from);
            if !piece.is_empty() && piece.color() != color && piece.threatens(from, square, &scan) {
                threats.push(Range::new(from, square));
            }
        }

        threats
    }

    /// Whether any friendly non-king piece can land on any square of any
    /// threat's line (the threatener's own square included). A single
    /// blockable threat is enough; simultaneous threats are not required
    /// to share a resolving move.
    pub fn can_block(&self, threats: &[Range], color: Color) -> bool {
        for threat in threats {
            for target in threat.line() {
                for from in Square::all() {
                    let piece = self.piece_at(from);
                    if !piece.is_empty()
                        && !piece.is_king()
                        && piece.color() == color
                        && piece.sees(from, target, self)
                    {
                        return true;
                    }
                }
            }
        }

        false
    }

    fn apply(&self, transfers: &[Transfer]) {
        let mut inner = self.inner.lock().unwrap();

        for transfer in transfers {
            let piece = std::mem::replace(
                &mut inner.grid[transfer.from.rank() as usize][transfer.from.file() as usize],
                Piece::empty(),
            );
            inner.grid[transfer.to.rank() as usize][transfer.to.file() as usize] = piece;
            inner.rights.remove(CastlingRights::lost_from(transfer.from));
        }
    }

    /// A detached copy of the position, optionally with one square
    /// emptied, for threat scanning.
    fn snapshot(&self, ignore: Option<Square>) -> Board {
        let (mut grid, rights) = {
            let inner = self.inner.lock().unwrap();
            (inner.grid.clone(), inner.rights)
        };

        if let Some(square) = ignore {
            grid[square.rank() as usize][square.file() as usize] = Piece::empty();
        }

        Board {
            inner: Mutex::new(Inner { grid, rights }),
        }
    }

    #[cfg(test)]
    pub(crate) fn place(&self, square: Square, piece: Piece) {
        let mut inner = self.inner.lock().unwrap();
        inner.grid[square.rank() as usize][square.file() as usize] = piece;
    }
}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();

        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                write!(f, " {}", inner.grid[rank][file].notation())?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

fn back_rank(color: Color) -> [Piece; 8] {
    [
        Piece::rook(color),
        Piece::knight(color),
        Piece::bishop(color),
        Piece::queen(color),
        Piece::king(color),
        Piece::bishop(color),
        Piece::knight(color),
        Piece::rook(color),
    ]
}
