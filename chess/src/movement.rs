//! Movement policies.
//!
//! Every piece carries one policy from a closed set of variants. A policy
//! answers three questions: does the geometry hold at all (`is_valid`), is
//! the move actually playable on a given board (`is_allowed`, which yields
//! the atomic square transfers the move decomposes into), and does the
//! piece have anywhere legal to go (`has_moves`).

use crate::board::Board;
use crate::piece::{Color, Piece, PieceKind};
use crate::square::{Range, Square};

/// One atomic square transfer. A plain move is a single transfer; castling
/// decomposes into two (king and rook).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: Square,
    pub to: Square,
}

impl Transfer {
    pub fn new(from: Square, to: Square) -> Transfer {
        Transfer { from, to }
    }
}

/// A movement policy. `limit` of zero on the sliding variants means
/// unlimited distance.
#[derive(Debug, Clone, PartialEq)]
pub enum Movement {
    /// Along a rank or file, at most `limit` squares.
    Straight { limit: u8 },
    /// Along a diagonal, at most `limit` squares.
    Diagonal { limit: u8 },
    /// The knight's (±2, ±1) / (±1, ±2) jump.
    LMovement,
    /// Pawn movement in rank direction `dir`: one square forward, two from
    /// the start rank, captures one square diagonally forward.
    Forward { dir: i8 },
    /// King-only: from `origin` to file c or g on the home rank, moving the
    /// corner rook along with the king.
    Castle { origin: Square },
    /// Union of policies: a move is legal if any member accepts it.
    Combined(Vec<Movement>),
}

impl Movement {
    /// Pure geometry: could a piece with this policy ever go from `from`
    /// to `to` on an empty board?
    pub fn is_valid(&self, from: Square, to: Square) -> bool {
        if from == to {
            return false;
        }

        let dr = (to.rank() as i8 - from.rank() as i8).abs() as u8;
        let df = (to.file() as i8 - from.file() as i8).abs() as u8;

        match self {
            Movement::Straight { limit } => {
                (dr == 0 || df == 0) && (*limit == 0 || dr.max(df) <= *limit)
            }
            Movement::Diagonal { limit } => dr == df && (*limit == 0 || dr <= *limit),
            Movement::LMovement => (dr == 2 && df == 1) || (dr == 1 && df == 2),
            Movement::Forward { dir } => {
                let advance = to.rank() as i8 - from.rank() as i8;

                if df == 0 {
                    advance == *dir || (advance == 2 * dir && from.rank() == start_rank(*dir))
                } else {
                    df == 1 && advance == *dir
                }
            }
            Movement::Castle { origin } => {
                from == *origin && to.rank() == origin.rank() && (to.file() == 2 || to.file() == 6)
            }
            Movement::Combined(movements) => movements.iter().any(|m| m.is_valid(from, to)),
        }
    }

    /// The full move check against a board: geometry holds, the path is
    /// clear and the destination admits the mover. Returns the atomic
    /// transfers the move performs; empty means disallowed.
    pub fn is_allowed(
        &self,
        from: Square,
        to: Square,
        color: Color,
        board: &Board,
    ) -> Vec<Transfer> {
        match self {
            Movement::Straight { .. } | Movement::Diagonal { .. } => {
                self.slide(from, to, color, board)
            }
            Movement::LMovement => {
                if !self.is_valid(from, to) {
                    return Vec::new();
                }

                let dest = board.piece_at(to);
                if dest.is_empty() || dest.color() != color {
                    vec![Transfer::new(from, to)]
                } else {
                    Vec::new()
                }
            }
            Movement::Forward { dir } => self.advance(from, to, *dir, color, board),
            Movement::Castle { origin } => self.castle(from, to, *origin, color, board),
            Movement::Combined(movements) => movements
                .iter()
                .map(|m| m.is_allowed(from, to, color, board))
                .find(|transfers| !transfers.is_empty())
                .unwrap_or_default(),
        }
    }

    /// Whether the piece at `from` has at least one legal destination.
    /// When that piece is a king, destinations that would remain
    /// threatened are excluded, with the king lifted off `from` during the
    /// scan so it cannot shield a destination on its own line.
    pub fn has_moves(&self, from: Square, board: &Board) -> bool {
        let piece = board.piece_at(from);
        if piece.is_empty() {
            return false;
        }

        match self {
            Movement::Straight { .. } => [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .iter()
                .filter_map(|&(dr, df)| from.offset(dr, df))
                .any(|to| self.escapes(from, to, &piece, board)),
            Movement::Diagonal { .. } => [(1, 1), (1, -1), (-1, 1), (-1, -1)]
                .iter()
                .filter_map(|&(dr, df)| from.offset(dr, df))
                .any(|to| self.escapes(from, to, &piece, board)),
            Movement::LMovement => [
                (2, 1),
                (2, -1),
                (-2, 1),
                (-2, -1),
                (1, 2),
                (1, -2),
                (-1, 2),
                (-1, -2),
            ]
            .iter()
            .filter_map(|&(dr, df)| from.offset(dr, df))
            .any(|to| self.escapes(from, to, &piece, board)),
            Movement::Forward { dir } => [(*dir, 0), (*dir, 1), (*dir, -1)]
                .iter()
                .filter_map(|&(dr, df)| from.offset(dr, df))
                .any(|to| self.escapes(from, to, &piece, board)),
            Movement::Castle { origin } => [2, 6]
                .iter()
                .map(|&file| Square::new(origin.rank(), file))
                .any(|to| self.escapes(from, to, &piece, board)),
            Movement::Combined(movements) => movements.iter().any(|m| m.has_moves(from, board)),
        }
    }

    /// Threat-scan view of the policy. Pawns threaten exactly their
    /// forward diagonals, occupied or not; castling threatens nothing;
    /// everything else threatens what it could move to.
    pub(crate) fn threatens(&self, from: Square, to: Square, color: Color, board: &Board) -> bool {
        match self {
            Movement::Forward { dir } => {
                let advance = to.rank() as i8 - from.rank() as i8;
                let df = (to.file() as i8 - from.file() as i8).abs();
                advance == *dir && df == 1
            }
            Movement::Castle { .. } => false,
            Movement::Combined(movements) => movements
                .iter()
                .any(|m| m.threatens(from, to, color, board)),
            _ => !self.is_allowed(from, to, color, board).is_empty(),
        }
    }

    fn escapes(&self, from: Square, to: Square, piece: &Piece, board: &Board) -> bool {
        if self.is_allowed(from, to, piece.color(), board).is_empty() {
            return false;
        }

        !piece.is_king()
            || board
                .threats_ignoring(to, piece.color(), Some(from))
                .is_empty()
    }

    /// Sliding movement: every interior square must be empty, and the
    /// destination is checked separately (empty, or an enemy capture).
    fn slide(&self, from: Square, to: Square, color: Color, board: &Board) -> Vec<Transfer> {
        if !self.is_valid(from, to) {
            return Vec::new();
        }

        let range = Range::new(from, to);
        if range.interior().any(|sq| !board.piece_at(sq).is_empty()) {
            return Vec::new();
        }

        let dest = board.piece_at(to);
        if !dest.is_empty() && dest.color() == color {
            return Vec::new();
        }

        vec![Transfer::new(from, to)]
    }

    fn advance(
        &self,
        from: Square,
        to: Square,
        dir: i8,
        color: Color,
        board: &Board,
    ) -> Vec<Transfer> {
        if !self.is_valid(from, to) {
            return Vec::new();
        }

        let dest = board.piece_at(to);
        let capture = from.file() != to.file();

        let allowed = if capture {
            !dest.is_empty() && dest.color() != color
        } else {
            dest.is_empty()
                && Range::new(from, to)
                    .interior()
                    .all(|sq| board.piece_at(sq).is_empty())
        };

        if allowed {
            vec![Transfer::new(from, to)]
        } else {
            Vec::new()
        }
    }

    fn castle(
        &self,
        from: Square,
        to: Square,
        origin: Square,
        color: Color,
        board: &Board,
    ) -> Vec<Transfer> {
        if !self.is_valid(from, to) {
            return Vec::new();
        }

        let kingside = to.file() == 6;
        if !board.castling_rights().allows(color, kingside) {
            return Vec::new();
        }

        let corner = Square::new(origin.rank(), if kingside { 7 } else { 0 });
        let rook = board.piece_at(corner);
        if rook.kind() != PieceKind::Rook || rook.color() != color {
            return Vec::new();
        }

        if Range::new(from, corner)
            .interior()
            .any(|sq| !board.piece_at(sq).is_empty())
        {
            return Vec::new();
        }

        // The king may not castle out of, through, or into check.
        let traversed = std::iter::once(from)
            .chain(Range::new(from, to).interior())
            .chain(std::iter::once(to));
        for sq in traversed {
            if !board.is_threatened(sq, color).is_empty() {
                return Vec::new();
            }
        }

        let rook_to = Square::new(origin.rank(), if kingside { 5 } else { 3 });
        vec![Transfer::new(from, to), Transfer::new(corner, rook_to)]
    }
}

/// The start rank of a pawn advancing in direction `dir`.
fn start_rank(dir: i8) -> u8 {
    if dir > 0 {
        1
    } else {
        6
    }
}
