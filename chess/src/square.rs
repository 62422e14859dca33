//! Board coordinates.
//!
//! Squares are addressed by their algebraic names ("e4") and stored as a
//! (rank, file) pair, both 0-indexed from white's corner of the board. A
//! `Range` is the ordered walk between two squares; path clearance and
//! threat lines are both expressed in terms of it.

use std::fmt;
use std::str::FromStr;

/// Error produced when an algebraic square name does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareError {
    /// The name is not exactly two characters.
    Length,
    /// The file character is outside 'a'..='h'.
    File(char),
    /// The rank character is outside '1'..='8'.
    Rank(char),
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::Length => write!(f, "square name must be two characters"),
            SquareError::File(c) => write!(f, "invalid file '{}'", c),
            SquareError::Rank(c) => write!(f, "invalid rank '{}'", c),
        }
    }
}

impl std::error::Error for SquareError {}

/// A single cell of the board. Rank 0 is white's back rank, file 0 is the
/// a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    /// Build a square from 0-indexed rank and file. Both must be below 8.
    pub fn new(rank: u8, file: u8) -> Square {
        debug_assert!(rank < 8 && file < 8);
        Square { rank, file }
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn file(self) -> u8 {
        self.file
    }

    /// The square offset by `dr` ranks and `df` files, or `None` when that
    /// steps off the board.
    pub fn offset(self, dr: i8, df: i8) -> Option<Square> {
        let rank = self.rank as i8 + dr;
        let file = self.file as i8 + df;

        if (0..8).contains(&rank) && (0..8).contains(&file) {
            Some(Square::new(rank as u8, file as u8))
        } else {
            None
        }
    }

    /// Iterate every square of the board, a1 through h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8).flat_map(|rank| (0..8).map(move |file| Square::new(rank, file)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Square, SquareError> {
        let mut chars = s.chars();

        let (file, rank) = match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => (file, rank),
            _ => return Err(SquareError::Length),
        };

        if !('a'..='h').contains(&file) {
            return Err(SquareError::File(file));
        }
        if !('1'..='8').contains(&rank) {
            return Err(SquareError::Rank(rank));
        }

        Ok(Square::new(rank as u8 - b'1', file as u8 - b'a'))
    }
}

/// The ordered walk between two squares, stepping at most one rank and one
/// file at a time in the direction fixed by the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    from: Square,
    to: Square,
}

impl Range {
    pub fn new(from: Square, to: Square) -> Range {
        Range { from, to }
    }

    /// The square the walk starts from (for a threat, the threatening piece).
    pub fn origin(self) -> Square {
        self.from
    }

    /// The square the walk ends on (for a threat, the threatened square).
    pub fn target(self) -> Square {
        self.to
    }

    fn step(self) -> (i8, i8) {
        let dr = (self.to.rank as i8 - self.from.rank as i8).signum();
        let df = (self.to.file as i8 - self.from.file as i8).signum();
        (dr, df)
    }

    /// Whether the endpoints share a rank, a file, or a diagonal. Only an
    /// aligned range has interior squares to walk.
    pub fn aligned(self) -> bool {
        let dr = (self.to.rank as i8 - self.from.rank as i8).abs();
        let df = (self.to.file as i8 - self.from.file as i8).abs();
        dr == 0 || df == 0 || dr == df
    }

    /// The squares strictly between the endpoints. Empty for adjacent
    /// endpoints and for unaligned ones (a knight jump has no interior).
    pub fn interior(self) -> Interior {
        let cur = if self.aligned() && self.from != self.to {
            Some(self.from)
        } else {
            None
        };
        Interior { range: self, cur }
    }

    /// The blockable line of a threat: the origin square itself (capturing
    /// the threatener resolves the threat) followed by every interior
    /// square. The target is excluded.
    pub fn line(self) -> impl Iterator<Item = Square> {
        std::iter::once(self.from).chain(self.interior())
    }
}

/// Iterator over the squares strictly between a range's endpoints.
pub struct Interior {
    range: Range,
    cur: Option<Square>,
}

impl Iterator for Interior {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        let cur = self.cur.take()?;
        let (dr, df) = self.range.step();
        let next = cur.offset(dr, df)?;

        if next == self.range.to {
            return None;
        }

        self.cur = Some(next);
        Some(next)
    }
}
