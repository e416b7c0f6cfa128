//! Players for the board game 'Connect 4', from random movers to full searches
//!
//! Every player implements [`player::Player`] and picks a column for the
//! position it is given: tactical one- and two-move lookahead, fixed-depth
//! negamax with alpha-beta pruning (optionally backed by a transposition
//! table) and Monte Carlo tree search. The [`game`] module pits them against
//! each other.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_arena::{bitboard::BitBoard, evaluator::Value, solver::NMoveSolver};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut solver = NMoveSolver::new(4);
//! let (value, best_move) = solver.solve(&BitBoard::from_moves("112233")?)?;
//!
//! // player one completes the bottom row on ply 7
//! assert!((value, best_move) == (Value::Win(7), 3));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod error;

pub mod bitboard;

pub mod movegen;

pub mod player;

pub mod evaluator;

pub mod tactical;

pub mod transposition_table;

pub mod solver;

pub mod mcts;

pub mod game;

pub mod config;


pub use bitboard::{BitBoard, Outcome, Side};
pub use error::{Error, Result};
pub use player::Player;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
