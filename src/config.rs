//! Textual player specifications, as used on the command line
//!
//! `random`, `one-move`, `two-move`, `simple:N`, `n-move:N`, `tt:N` and `mcts:N`,
//! where `N` is a search depth, or an iteration count for `mcts`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::mcts::{MctsConfig, MctsSolver};
use crate::player::{Player, RandomPlayer};
use crate::solver::{NMoveSolver, SimpleNMoveSolver, TranspositionSolver};
use crate::tactical::{OneMoveSolver, TwoMoveSolver};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerKind {
    Random,
    OneMove,
    TwoMove,
    Simple(u32),
    NMove(u32),
    Transposition(u32),
    Mcts(u32),
}

impl PlayerKind {
    /// Creates a fresh player; `seed` fixes the random source of the players
    /// that have one
    pub fn build(&self, seed: Option<u64>) -> Box<dyn Player + Send> {
        match *self {
            PlayerKind::Random => Box::new(match seed {
                Some(seed) => RandomPlayer::seeded(seed),
                None => RandomPlayer::new(),
            }),
            PlayerKind::OneMove => Box::new(OneMoveSolver),
            PlayerKind::TwoMove => Box::new(TwoMoveSolver),
            PlayerKind::Simple(depth) => Box::new(SimpleNMoveSolver::new(depth)),
            PlayerKind::NMove(depth) => Box::new(NMoveSolver::new(depth)),
            PlayerKind::Transposition(depth) => Box::new(TranspositionSolver::new(depth)),
            PlayerKind::Mcts(iterations) => {
                let mut config = MctsConfig::default().with_iterations(iterations);
                config.seed = seed;
                Box::new(MctsSolver::new(config))
            }
        }
    }
}

impl FromStr for PlayerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPlayer(s.to_string());
        let input = s.trim().to_ascii_lowercase();
        let (name, arg) = match input.split_once(':') {
            Some((name, arg)) => {
                let arg: u32 = arg.trim().parse().map_err(|_| invalid())?;
                if arg == 0 {
                    return Err(invalid());
                }
                (name.trim(), Some(arg))
            }
            None => (input.as_str(), None),
        };

        match (name, arg) {
            ("random", None) => Ok(PlayerKind::Random),
            ("one-move", None) => Ok(PlayerKind::OneMove),
            ("two-move", None) => Ok(PlayerKind::TwoMove),
            ("simple", Some(depth)) => Ok(PlayerKind::Simple(depth)),
            ("n-move", Some(depth)) => Ok(PlayerKind::NMove(depth)),
            ("tt", Some(depth)) => Ok(PlayerKind::Transposition(depth)),
            ("mcts", Some(iterations)) => Ok(PlayerKind::Mcts(iterations)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlayerKind::Random => write!(f, "random"),
            PlayerKind::OneMove => write!(f, "one-move"),
            PlayerKind::TwoMove => write!(f, "two-move"),
            PlayerKind::Simple(depth) => write!(f, "simple:{}", depth),
            PlayerKind::NMove(depth) => write!(f, "n-move:{}", depth),
            PlayerKind::Transposition(depth) => write!(f, "tt:{}", depth),
            PlayerKind::Mcts(iterations) => write!(f, "mcts:{}", iterations),
        }
    }
}
