//! Pieces and their construction.
//!
//! `Empty` is a piece kind in its own right, so every cell of the board
//! always holds a `Piece` and no code path deals in optional cells.

use crate::board::Board;
use crate::movement::{Movement, Transfer};
use crate::square::Square;

use serde::Serialize;
use std::fmt;

/// The two sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The rank direction this side's pawns advance in.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The rank this side's king and rooks start on.
    pub fn home_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
    Empty,
}

/// A board cell's occupant: a kind, a color and the movement policy that
/// governs it. The empty piece carries no policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    kind: PieceKind,
    color: Color,
    movement: Option<Movement>,
}

impl Piece {
    pub fn empty() -> Piece {
        Piece {
            kind: PieceKind::Empty,
            color: Color::White,
            movement: None,
        }
    }

    pub fn pawn(color: Color) -> Piece {
        Piece {
            kind: PieceKind::Pawn,
            color,
            movement: Some(Movement::Forward {
                dir: color.forward(),
            }),
        }
    }

    pub fn rook(color: Color) -> Piece {
        Piece {
            kind: PieceKind::Rook,
            color,
            movement: Some(Movement::Straight { limit: 0 }),
        }
    }

    pub fn knight(color: Color) -> Piece {
        Piece {
            kind: PieceKind::Knight,
            color,
            movement: Some(Movement::LMovement),
        }
    }

    pub fn bishop(color: Color) -> Piece {
        Piece {
            kind: PieceKind::Bishop,
            color,
            movement: Some(Movement::Diagonal { limit: 0 }),
        }
    }

    pub fn queen(color: Color) -> Piece {
        Piece {
            kind: PieceKind::Queen,
            color,
            movement: Some(Movement::Combined(vec![
                Movement::Straight { limit: 0 },
                Movement::Diagonal { limit: 0 },
            ])),
        }
    }

    pub fn king(color: Color) -> Piece {
        let origin = Square::new(color.home_rank(), 4);
        Piece {
            kind: PieceKind::King,
            color,
            movement: Some(Movement::Combined(vec![
                Movement::Straight { limit: 1 },
                Movement::Diagonal { limit: 1 },
                Movement::Castle { origin },
            ])),
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_empty(&self) -> bool {
        self.kind == PieceKind::Empty
    }

    pub fn is_king(&self) -> bool {
        self.kind == PieceKind::King
    }

    /// Single-letter notation, uppercase for white, lowercase for black.
    pub fn notation(&self) -> char {
        let letter = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
            PieceKind::Empty => return '.',
        };

        match self.color {
            Color::White => letter.to_ascii_uppercase(),
            Color::Black => letter,
        }
    }

    /// Whether this piece could move from `from` to `to` on the given
    /// board: geometry holds and the path and destination admit it.
    pub fn sees(&self, from: Square, to: Square, board: &Board) -> bool {
        match &self.movement {
            Some(movement) => !movement.is_allowed(from, to, self.color, board).is_empty(),
            None => false,
        }
    }

    /// Whether this piece threatens `to` from `from` in a threat scan. A
    /// pawn threatens exactly its forward diagonals whether or not they
    /// are occupied; every other piece threatens what it could move to.
    pub(crate) fn threatens(&self, from: Square, to: Square, board: &Board) -> bool {
        match &self.movement {
            Some(movement) => movement.threatens(from, to, self.color, board),
            None => false,
        }
    }

    /// The top-level move check: the atomic square transfers this move
    /// decomposes into, or empty when the move is not legal. A king move
    /// additionally requires an unthreatened destination, scanned with the
    /// king lifted off `from` so it cannot shield the target from the line
    /// it stands on.
    pub fn moves(&self, from: Square, to: Square, board: &Board) -> Vec<Transfer> {
        let movement = match &self.movement {
            Some(movement) => movement,
            None => return Vec::new(),
        };

        let transfers = movement.is_allowed(from, to, self.color, board);
        if transfers.is_empty() {
            return transfers;
        }

        if self.is_king()
            && !board
                .threats_ignoring(to, self.color, Some(from))
                .is_empty()
        {
            return Vec::new();
        }

        transfers
    }

    /// Whether the piece has at least one legal destination from `from`.
    /// For a king this excludes destinations that would remain in check.
    pub fn has_moves(&self, from: Square, board: &Board) -> bool {
        match &self.movement {
            Some(movement) => movement.has_moves(from, board),
            None => false,
        }
    }
}
