//! The move-selection capability shared by every solver

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bitboard::BitBoard;
use crate::error::{Error, Result};

/// Anything that can pick a column for the player to move
pub trait Player {
    /// Returns a column that is legal on `board`, or `Error::InvalidState`
    /// if the game is already over.
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize>;

    fn name(&self) -> &str;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        (**self).choose_move(board)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Fails with `InvalidState` when there is nothing left to play
pub(crate) fn ensure_in_progress(board: &BitBoard) -> Result<()> {
    if board.outcome().is_terminal() {
        Err(Error::InvalidState)
    } else {
        Ok(())
    }
}

/// Picks uniformly among the legal columns
pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RandomPlayer {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        ensure_in_progress(board)?;
        let moves = board.legal_moves();
        Ok(moves.as_slice()[self.rng.random_range(0..moves.len())])
    }

    fn name(&self) -> &str {
        "random"
    }
}
