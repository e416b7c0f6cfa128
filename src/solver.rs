//! Fixed-depth game tree search
//!
//! # Position Scoring
//! Values are always from the point of view of the player to move. A game won
//! on ply `p` is `Value::Win(p)` to the winner and `Value::Loss(p)` to the
//! loser, so earlier wins rank higher. A tie is worth 0. Anything not decided
//! within the depth budget is scored by an [`Evaluator`] as `Value::Score`,
//! which ranks between every loss and every win.

use log::debug;

use crate::bitboard::{BitBoard, Outcome};
use crate::error::{Error, Result};
use crate::evaluator::{Evaluator, ThreatEvaluator, Value};
use crate::movegen::{threat_ordered, Moves};
use crate::player::{ensure_in_progress, Player};
use crate::tactical::winning_move;
use crate::transposition_table::{Bound, Entry, Memo, NoMemo, TranspositionTable};

fn heuristic<E: Evaluator>(evaluator: &E, board: &BitBoard) -> Value {
    Value::estimate(evaluator.score(board))
}

/// Exact value of a finished game for the player to move
fn terminal_value(board: &BitBoard) -> Option<Value> {
    match board.outcome() {
        Outcome::InProgress => None,
        Outcome::Tie => Some(Value::Score(0.0)),
        outcome if outcome.winner() == Some(board.side_to_move()) => {
            Some(Value::Win(board.num_moves()))
        }
        _ => Some(Value::Loss(board.num_moves())),
    }
}

/// Negamax with alpha-beta pruning, shared by the pruned solvers
struct Search<'a, E, M> {
    evaluator: &'a E,
    memo: &'a mut M,
    node_count: usize,
}

impl<'a, E: Evaluator, M: Memo> Search<'a, E, M> {
    /// Returns the value of `board` searched `depth` plies deep
    ///
    /// A result inside `(alpha, beta)` is exact; a result at or below `alpha`
    /// is an upper bound and one at or above `beta` a lower bound.
    fn negamax(&mut self, board: &BitBoard, depth: u32, mut alpha: Value, mut beta: Value) -> Value {
        self.node_count += 1;

        if let Some(value) = terminal_value(board) {
            return value;
        }
        if depth == 0 {
            return heuristic(self.evaluator, board);
        }
        // nothing beats winning on this ply
        if winning_move(board).is_some() {
            return Value::Win(board.num_moves() + 1);
        }

        // try to fetch the value or a bound on it from the table
        let key = board.key();
        let mut hint = None;
        if let Some(entry) = self.memo.lookup(key) {
            hint = entry.best_move;
            if u32::from(entry.depth) >= depth {
                match entry.bound {
                    Bound::Exact => return entry.value,
                    Bound::Lower => alpha = alpha.max(entry.value),
                    Bound::Upper => beta = beta.min(entry.value),
                }
                if alpha >= beta {
                    // prune the exploration
                    return entry.value;
                }
            }
        }
        let floor = alpha;

        let mut moves = threat_ordered(board);
        if let Some(column) = hint {
            moves.promote(column as usize);
        }

        let mut best = Value::MIN;
        let mut best_move = None;
        for column in moves {
            // the search window is flipped for the other player
            let score = -self.negamax(&board.after(column), depth - 1, -beta, -alpha);
            if score > best {
                best = score;
                best_move = Some(column as u8);
            }
            if score > alpha {
                alpha = score;
                // a perfect opponent will not let the game reach this node
                if alpha >= beta {
                    break;
                }
            }
        }

        let bound = if best <= floor {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.memo.store(
            key,
            Entry {
                depth: depth.min(u8::MAX as u32) as u8,
                value: best,
                bound,
                best_move,
            },
        );
        best
    }

    /// Searches every root move with the table bypassed, keeping the first
    /// best column in center-out order
    fn root(&mut self, board: &BitBoard, depth: u32) -> Result<(Value, usize)> {
        ensure_in_progress(board)?;

        let mut best: Option<(Value, usize)> = None;
        for column in Moves::center_first(board) {
            let alpha = best.map_or(Value::MIN, |(value, _)| value);
            let score = -self.negamax(&board.after(column), depth - 1, Value::MIN, -alpha);
            if best.map_or(true, |(value, _)| score > value) {
                best = Some((score, column));
            }
        }
        best.ok_or(Error::InvalidState)
    }
}

/// Looks `depth` plies ahead with alpha-beta pruning and scores the horizon
/// with an [`Evaluator`]
#[derive(Clone, Debug)]
pub struct NMoveSolver<E = ThreatEvaluator> {
    depth: u32,
    evaluator: E,
    /// The number of nodes searched by this solver so far (for diagnostics only)
    pub node_count: usize,
}

impl NMoveSolver {
    pub fn new(depth: u32) -> Self {
        Self::with_evaluator(depth, ThreatEvaluator::default())
    }
}

impl<E: Evaluator> NMoveSolver<E> {
    /// A depth of 0 is treated as 1
    pub fn with_evaluator(depth: u32, evaluator: E) -> Self {
        Self {
            depth: depth.max(1),
            evaluator,
            node_count: 0,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns the value of the position and the column achieving it
    pub fn solve(&mut self, board: &BitBoard) -> Result<(Value, usize)> {
        let mut memo = NoMemo;
        let mut search = Search {
            evaluator: &self.evaluator,
            memo: &mut memo,
            node_count: 0,
        };
        let result = search.root(board, self.depth);
        self.node_count += search.node_count;
        if let Ok((value, column)) = result {
            debug!(
                "n-move({}) picked column {} with value {} after {} nodes",
                self.depth,
                column + 1,
                value,
                search.node_count
            );
        }
        result
    }
}

impl<E: Evaluator> Player for NMoveSolver<E> {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        self.solve(board).map(|(_, column)| column)
    }

    fn name(&self) -> &str {
        "n-move"
    }
}

/// The n-move search backed by a transposition table that outlives single
/// decisions, so positions met again later in the game are not searched twice
///
/// The table belongs to this solver alone; give each concurrently running
/// solver its own.
#[derive(Clone)]
pub struct TranspositionSolver<E = ThreatEvaluator> {
    depth: u32,
    evaluator: E,
    table: TranspositionTable,
    /// The number of nodes searched by this solver so far (for diagnostics only)
    pub node_count: usize,
}

impl TranspositionSolver {
    pub fn new(depth: u32) -> Self {
        Self::with_evaluator(depth, ThreatEvaluator::default())
    }
}

impl<E: Evaluator> TranspositionSolver<E> {
    /// A depth of 0 is treated as 1
    pub fn with_evaluator(depth: u32, evaluator: E) -> Self {
        Self {
            depth: depth.max(1),
            evaluator,
            table: TranspositionTable::new(),
            node_count: 0,
        }
    }

    /// Replaces the solver's table, e.g. with one of a different capacity
    pub fn with_table(mut self, table: TranspositionTable) -> Self {
        self.table = table;
        self
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn table(&self) -> &TranspositionTable {
        &self.table
    }

    pub fn clear_table(&mut self) {
        self.table.clear();
    }

    /// Returns the value of the position and the column achieving it
    pub fn solve(&mut self, board: &BitBoard) -> Result<(Value, usize)> {
        let mut search = Search {
            evaluator: &self.evaluator,
            memo: &mut self.table,
            node_count: 0,
        };
        let result = search.root(board, self.depth);
        self.node_count += search.node_count;
        if let Ok((value, column)) = result {
            debug!(
                "transposition({}) picked column {} with value {} after {} nodes",
                self.depth,
                column + 1,
                value,
                search.node_count
            );
        }
        result
    }
}

impl<E: Evaluator> Player for TranspositionSolver<E> {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        self.solve(board).map(|(_, column)| column)
    }

    fn name(&self) -> &str {
        "transposition"
    }
}

/// Full-width negamax without pruning; slow, but the reference the pruned
/// solvers must agree with
#[derive(Clone, Debug)]
pub struct SimpleNMoveSolver<E = ThreatEvaluator> {
    depth: u32,
    evaluator: E,
    pub node_count: usize,
}

impl SimpleNMoveSolver {
    pub fn new(depth: u32) -> Self {
        Self::with_evaluator(depth, ThreatEvaluator::default())
    }
}

impl<E: Evaluator> SimpleNMoveSolver<E> {
    pub fn with_evaluator(depth: u32, evaluator: E) -> Self {
        Self {
            depth: depth.max(1),
            evaluator,
            node_count: 0,
        }
    }

    fn negamax(&mut self, board: &BitBoard, depth: u32) -> Value {
        self.node_count += 1;
        if let Some(value) = terminal_value(board) {
            return value;
        }
        if depth == 0 {
            return heuristic(&self.evaluator, board);
        }
        let mut best = Value::MIN;
        for column in board.legal_moves() {
            best = best.max(-self.negamax(&board.after(column), depth - 1));
        }
        best
    }

    pub fn solve(&mut self, board: &BitBoard) -> Result<(Value, usize)> {
        ensure_in_progress(board)?;
        let mut best: Option<(Value, usize)> = None;
        for column in Moves::center_first(board) {
            let score = -self.negamax(&board.after(column), self.depth - 1);
            if best.map_or(true, |(value, _)| score > value) {
                best = Some((score, column));
            }
        }
        best.ok_or(Error::InvalidState)
    }
}

impl<E: Evaluator> Player for SimpleNMoveSolver<E> {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        self.solve(board).map(|(_, column)| column)
    }

    fn name(&self) -> &str {
        "simple-n-move"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{ModelEvaluator, Score};
    use crate::WIDTH;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Random positions that are still being played
    fn random_positions(seed: u64, count: usize) -> Vec<BitBoard> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec::new();
        while positions.len() < count {
            let mut board = BitBoard::new();
            let plies = rng.random_range(0..20);
            for _ in 0..plies {
                let moves = board.legal_moves();
                let column = moves.as_slice()[rng.random_range(0..moves.len())];
                let next = board.after(column);
                if next.outcome().is_terminal() {
                    break;
                }
                board = next;
            }
            positions.push(board);
        }
        positions
    }

    #[test]
    fn takes_an_immediate_win() -> Result<()> {
        let board = BitBoard::from_moves("112233")?;
        for depth in 1..=5 {
            let (value, column) = NMoveSolver::new(depth).solve(&board)?;
            assert_eq!(column, 3);
            assert_eq!(value, Value::Win(7));
        }
        Ok(())
    }

    #[test]
    fn blocks_the_opponent() -> Result<()> {
        // player two to move, player one threatens the bottom of column 4
        let board = BitBoard::from_moves("1122337")?;
        for depth in 2..=5 {
            assert_eq!(NMoveSolver::new(depth).choose_move(&board)?, 3);
            assert_eq!(TranspositionSolver::new(depth).choose_move(&board)?, 3);
        }
        Ok(())
    }

    #[test]
    fn sees_a_forced_loss() -> Result<()> {
        // player two to move faces two open ends on the bottom row
        let board = BitBoard::from_moves("44335")?;
        assert_eq!(board.outcome(), Outcome::InProgress);
        let (value, _) = NMoveSolver::new(3).solve(&board)?;
        assert_eq!(value, Value::Loss(board.num_moves() + 2));
        Ok(())
    }

    #[test]
    fn pruning_agrees_with_full_width_search() -> Result<()> {
        for board in random_positions(11, 25) {
            for depth in 1..=4 {
                let expected = SimpleNMoveSolver::new(depth).solve(&board)?;
                assert_eq!(NMoveSolver::new(depth).solve(&board)?, expected, "{}", board);
            }
        }
        Ok(())
    }

    #[test]
    fn table_agrees_with_plain_search() -> Result<()> {
        for board in random_positions(5, 25) {
            for depth in 1..=6 {
                let expected = NMoveSolver::new(depth).solve(&board)?;
                let mut solver = TranspositionSolver::new(depth)
                    .with_table(TranspositionTable::with_capacity(1 << 16));
                assert_eq!(solver.solve(&board)?, expected, "{}", board);
            }
        }
        Ok(())
    }

    #[test]
    fn searches_are_deterministic() -> Result<()> {
        for board in random_positions(3, 10) {
            let mut solver = TranspositionSolver::new(6);
            let first = solver.solve(&board)?;
            // the second run starts from a warm table
            assert_eq!(solver.solve(&board)?, first);
            assert_eq!(TranspositionSolver::new(6).solve(&board)?, first);
            assert_eq!(NMoveSolver::new(6).solve(&board)?, NMoveSolver::new(6).solve(&board)?);
        }
        Ok(())
    }

    #[test]
    fn table_saves_work() -> Result<()> {
        let board = BitBoard::new();
        let mut plain = NMoveSolver::new(7);
        let mut memo = TranspositionSolver::new(7);
        assert_eq!(plain.solve(&board)?, memo.solve(&board)?);
        assert!(!memo.table().is_empty());
        assert!(memo.node_count < plain.node_count);
        Ok(())
    }

    #[test]
    fn evaluator_is_swappable() -> Result<()> {
        // a model that dislikes facing opponent stones in the leftmost column
        let model = ModelEvaluator::new(|planes: &[f32]| {
            -(0..crate::HEIGHT)
                .map(|row| planes[crate::WIDTH * crate::HEIGHT + row * crate::WIDTH])
                .sum::<f32>()
        });
        let mut solver = NMoveSolver::with_evaluator(1, model);
        assert_eq!(solver.choose_move(&BitBoard::new())?, 0);
        Ok(())
    }

    /// Rewards the player who has stones far to the right, on a scale far above
    /// any per-position constant
    struct RightLeaning;

    impl Evaluator for RightLeaning {
        fn score(&self, board: &BitBoard) -> Score {
            let opponent = board.side_mask(board.side_to_move().other());
            (0..WIDTH)
                .filter(|&column| opponent & BitBoard::bottom_mask(column) != 0)
                .map(|column| -((column + 1) as Score) * 1e7)
                .sum()
        }
    }

    #[test]
    fn large_estimates_keep_their_order() -> Result<()> {
        let board = BitBoard::new();
        let expected = (Value::Score(7e7), 6);
        assert_eq!(NMoveSolver::with_evaluator(1, RightLeaning).solve(&board)?, expected);
        assert_eq!(SimpleNMoveSolver::with_evaluator(1, RightLeaning).solve(&board)?, expected);
        assert_eq!(
            TranspositionSolver::with_evaluator(1, RightLeaning).solve(&board)?,
            expected
        );

        // a win on the spot still beats every estimate
        let board = BitBoard::from_moves("112233")?;
        for depth in 1..=3 {
            assert_eq!(
                NMoveSolver::with_evaluator(depth, RightLeaning).solve(&board)?,
                (Value::Win(7), 3)
            );
        }
        Ok(())
    }

    #[test]
    fn refuses_finished_games() -> Result<()> {
        let board = BitBoard::from_moves("1212121")?;
        assert_eq!(NMoveSolver::new(3).solve(&board), Err(Error::InvalidState));
        assert_eq!(
            TranspositionSolver::new(3).solve(&board),
            Err(Error::InvalidState)
        );
        assert_eq!(
            SimpleNMoveSolver::new(3).solve(&board),
            Err(Error::InvalidState)
        );
        Ok(())
    }
}
