//! Scoring of positions at the search horizon

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use crate::bitboard::BitBoard;
use crate::{HEIGHT, WIDTH};

/// Heuristic estimate of a position, higher is better for the player to move
pub type Score = f64;

/// Value of a position for the player to move, as found by a search
///
/// Proven results are kept apart from estimates: every loss ranks below every
/// estimate and every win above, whatever the magnitude of the estimate. The
/// ply is counted from the start of the game; an earlier win and a later loss
/// rank higher.
#[derive(Copy, Clone, Debug)]
pub enum Value {
    /// the player to move loses on this ply
    Loss(usize),
    Score(Score),
    /// the player to move wins on this ply
    Win(usize),
}

impl Value {
    /// Ranks below every reachable value
    pub const MIN: Value = Value::Loss(0);
    /// Ranks above every reachable value
    pub const MAX: Value = Value::Win(0);

    /// Wraps an evaluator's output, reading NaN as 0
    pub fn estimate(score: Score) -> Value {
        if score.is_nan() {
            Value::Score(0.0)
        } else {
            Value::Score(score)
        }
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        match self {
            Value::Loss(ply) => Value::Win(ply),
            Value::Score(score) => Value::Score(-score),
            Value::Win(ply) => Value::Loss(ply),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Value::Loss(a), Value::Loss(b)) => a.cmp(&b),
            (Value::Win(a), Value::Win(b)) => b.cmp(&a),
            (Value::Score(a), Value::Score(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Value::Loss(_), _) | (Value::Score(_), Value::Win(_)) => Ordering::Less,
            _ => Ordering::Greater,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Loss(ply) => write!(f, "loss on ply {}", ply),
            Value::Score(score) => write!(f, "{:.1}", score),
            Value::Win(ply) => write!(f, "win on ply {}", ply),
        }
    }
}

/// Size of the feature planes handed to a learned model
pub const FEATURES: usize = 3 * WIDTH * HEIGHT;

/// A deterministic scoring function consulted where the exact outcome is unknown
///
/// Values only need to be comparable within one search. Any finite value is
/// allowed: the search ranks every proven result apart from them.
pub trait Evaluator {
    fn score(&self, board: &BitBoard) -> Score;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn score(&self, board: &BitBoard) -> Score {
        (**self).score(board)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn score(&self, board: &BitBoard) -> Score {
        (**self).score(board)
    }
}

/// Counts open alignment ends for both players, with a bonus for central stones
#[derive(Copy, Clone, Debug)]
pub struct ThreatEvaluator {
    pub threat_weight: Score,
    pub center_weight: Score,
}

impl Default for ThreatEvaluator {
    fn default() -> Self {
        Self {
            threat_weight: 10.0,
            center_weight: 1.0,
        }
    }
}

impl Evaluator for ThreatEvaluator {
    fn score(&self, board: &BitBoard) -> Score {
        let own = board.own_winning_positions().count_ones() as Score;
        let opponent = board.opponent_winning_positions().count_ones() as Score;

        let center = BitBoard::column_mask(WIDTH / 2);
        let own_center = (board.player_mask() & center).count_ones() as Score;
        let opponent_center =
            ((board.player_mask() ^ board.board_mask()) & center).count_ones() as Score;

        self.threat_weight * (own - opponent) + self.center_weight * (own_center - opponent_center)
    }
}

/// Forwards the board to an external model as feature planes
///
/// The model is opaque: any `Fn(&[f32]) -> f32` over [`features`] works, e.g. a
/// network loaded by the caller.
pub struct ModelEvaluator<F> {
    model: F,
}

impl<F> ModelEvaluator<F>
where
    F: Fn(&[f32]) -> f32,
{
    pub fn new(model: F) -> Self {
        Self { model }
    }
}

impl<F> Evaluator for ModelEvaluator<F>
where
    F: Fn(&[f32]) -> f32,
{
    fn score(&self, board: &BitBoard) -> Score {
        (self.model)(&features(board)) as Score
    }
}

/// Encodes a board relative to the player to move, rows bottom to top
///
/// Plane 0 holds the mover's stones, plane 1 the opponent's, plane 2 the cell
/// each legal column would fill next.
pub fn features(board: &BitBoard) -> [f32; FEATURES] {
    let mut data = [0.0; FEATURES];
    let mover = board.side_to_move();
    let plane = WIDTH * HEIGHT;

    for row in 0..HEIGHT {
        for column in 0..WIDTH {
            let idx = row * WIDTH + column;
            match board.cell(column, row) {
                Some(side) if side == mover => data[idx] = 1.0,
                Some(_) => data[plane + idx] = 1.0,
                None => {}
            }
        }
    }
    for column in board.legal_moves() {
        if let Some(height) = board.height(column) {
            data[2 * plane + height * WIDTH + column] = 1.0;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::Side;
    use crate::error::Result;

    #[test]
    fn proven_results_outrank_any_estimate() {
        let mut values = vec![
            Value::Win(9),
            Value::estimate(Score::MAX),
            Value::Loss(12),
            Value::Win(7),
            Value::estimate(-1e300),
            Value::Loss(8),
            Value::estimate(0.0),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Loss(8),
                Value::Loss(12),
                Value::Score(-1e300),
                Value::Score(0.0),
                Value::Score(Score::MAX),
                Value::Win(9),
                Value::Win(7),
            ]
        );
        assert!(Value::MIN < Value::Loss(1) && Value::Win(1) < Value::MAX);
        assert_eq!(-Value::Win(7), Value::Loss(7));
        assert_eq!(-Value::Score(2.5), Value::Score(-2.5));
        assert_eq!(-Value::Score(0.0), Value::Score(0.0));
        assert_eq!(Value::estimate(Score::NAN), Value::Score(0.0));
    }

    #[test]
    fn threats_favour_the_attacker() -> Result<()> {
        // player one has an open three on the bottom row, player two to move
        let board = BitBoard::from_moves("11223")?;
        let evaluator = ThreatEvaluator::default();
        assert_eq!(evaluator.score(&board), -10.0);
        Ok(())
    }

    #[test]
    fn empty_board_is_balanced() {
        assert_eq!(ThreatEvaluator::default().score(&BitBoard::new()), 0.0);
    }

    #[test]
    fn features_are_relative_to_the_mover() -> Result<()> {
        let board = BitBoard::from_moves("4")?;
        let data = features(&board);
        let plane = WIDTH * HEIGHT;

        assert_eq!(board.side_to_move(), Side::Two);
        // player one's stone is the opponent's from player two's point of view
        assert_eq!(data[3], 0.0);
        assert_eq!(data[plane + 3], 1.0);
        // the next stone in column 4 lands on the second row
        assert_eq!(data[2 * plane + WIDTH + 3], 1.0);
        assert_eq!(data[2 * plane..].iter().sum::<f32>(), WIDTH as f32);
        Ok(())
    }

    #[test]
    fn model_evaluator_passes_features_through() -> Result<()> {
        let evaluator = ModelEvaluator::new(|planes: &[f32]| planes[..WIDTH * HEIGHT].iter().sum());
        let board = BitBoard::from_moves("445")?;
        // player two to move owns one stone
        assert_eq!(evaluator.score(&board), 1.0);
        Ok(())
    }
}
