//! Chess rules core: squares, pieces, movement policies, and the board
//! with its threat, blocking and mate machinery.
//!
//! This crate knows nothing about sessions, clocks or the wire; it
//! answers exactly one kind of question: given a position, what does a
//! requested move do, and what state is the side to move in.

pub mod board;
pub mod movement;
pub mod piece;
pub mod square;

pub use board::{Board, CastlingRights};
pub use movement::{Movement, Transfer};
pub use piece::{Color, Piece, PieceKind};
pub use square::{Range, Square, SquareError};
