//! Monte Carlo tree search
//!
//! Each decision grows a fresh tree out of random playouts and throws it away
//! afterwards. Nodes live in one `Vec` and refer to each other by index, so the
//! four phases (select, expand, simulate, backpropagate) run as plain loops.

use std::time::{Duration, Instant};

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bitboard::{BitBoard, Outcome};
use crate::error::{Error, Result};
use crate::movegen::MOVE_ORDER;
use crate::player::{ensure_in_progress, Player};

/// How long a single decision may search
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Budget {
    Iterations(u32),
    /// checked before every iteration, so one playout may overrun it
    Time(Duration),
}

#[derive(Copy, Clone, Debug)]
pub struct MctsConfig {
    pub budget: Budget,
    /// weight of the exploration term of the UCB score
    pub exploration: f64,
    /// seed for playouts and expansion; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            budget: Budget::Iterations(1000),
            exploration: std::f64::consts::SQRT_2,
            seed: None,
        }
    }
}

impl MctsConfig {
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_iterations(self, iterations: u32) -> Self {
        self.with_budget(Budget::Iterations(iterations))
    }

    pub fn with_time(self, limit: Duration) -> Self {
        self.with_budget(Budget::Time(limit))
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

struct Node {
    board: BitBoard,
    parent: Option<usize>,
    /// the column played to reach this node from its parent
    column: usize,
    children: Vec<usize>,
    untried: Vec<usize>,
    visits: u32,
    /// summed results for the player who moved into this node
    reward: f64,
}

impl Node {
    fn new(board: BitBoard, parent: Option<usize>, column: usize) -> Self {
        let untried = if board.outcome().is_terminal() {
            Vec::new()
        } else {
            board.legal_moves().collect()
        };
        Self {
            board,
            parent,
            column,
            children: Vec::new(),
            untried,
            visits: 0,
            reward: 0.0,
        }
    }

    fn ucb(&self, parent_visits: u32, exploration: f64) -> f64 {
        // visited at least once as soon as it is created
        let visits = self.visits as f64;
        self.reward / visits + exploration * ((parent_visits as f64).ln() / visits).sqrt()
    }
}

/// Picks moves by random sampling of the game tree
pub struct MctsSolver {
    config: MctsConfig,
    rng: StdRng,
    /// The number of iterations run by the last decision
    pub iterations: u32,
}

impl MctsSolver {
    pub fn new(config: MctsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            iterations: 0,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    fn exhausted(&self, iterations: u32, start: Instant) -> bool {
        // always search at least once so there is a move to return
        iterations > 0
            && match self.config.budget {
                Budget::Iterations(limit) => iterations >= limit,
                Budget::Time(limit) => start.elapsed() >= limit,
            }
    }

    fn select(&self, tree: &[Node]) -> usize {
        let mut node = 0;
        while tree[node].untried.is_empty() && !tree[node].children.is_empty() {
            let parent_visits = tree[node].visits;
            let mut best = tree[node].children[0];
            let mut best_score = f64::NEG_INFINITY;
            for &child in &tree[node].children {
                let score = tree[child].ucb(parent_visits, self.config.exploration);
                if score > best_score {
                    best = child;
                    best_score = score;
                }
            }
            node = best;
        }
        node
    }

    fn expand(&mut self, tree: &mut Vec<Node>, node: usize) -> usize {
        if tree[node].untried.is_empty() {
            return node;
        }
        let pick = self.rng.random_range(0..tree[node].untried.len());
        let column = tree[node].untried.swap_remove(pick);
        let board = tree[node].board.after(column);
        let child = tree.len();
        tree.push(Node::new(board, Some(node), column));
        tree[node].children.push(child);
        child
    }

    fn simulate(&mut self, board: &BitBoard) -> Outcome {
        let mut board = *board;
        loop {
            match board.outcome() {
                Outcome::InProgress => {
                    let moves = board.legal_moves();
                    board.push(moves.as_slice()[self.rng.random_range(0..moves.len())]);
                }
                outcome => return outcome,
            }
        }
    }

    fn backpropagate(tree: &mut [Node], leaf: usize, outcome: Outcome) {
        let mut current = Some(leaf);
        while let Some(node) = current {
            let mover = tree[node].board.side_to_move().other();
            tree[node].visits += 1;
            tree[node].reward += match outcome.winner() {
                Some(winner) if winner == mover => 1.0,
                Some(_) => -1.0,
                None => 0.0,
            };
            current = tree[node].parent;
        }
    }

    /// Grows a tree rooted at `board` until the budget runs out
    fn grow(&mut self, board: &BitBoard) -> Vec<Node> {
        let start = Instant::now();
        let mut tree = vec![Node::new(*board, None, 0)];
        let mut iterations = 0;
        while !self.exhausted(iterations, start) {
            let node = self.select(&tree);
            let leaf = self.expand(&mut tree, node);
            // finished games need no playout
            let outcome = self.simulate(&tree[leaf].board);
            Self::backpropagate(&mut tree, leaf, outcome);
            iterations += 1;
        }
        self.iterations = iterations;
        tree
    }

    /// Runs one decision and returns the most visited root move
    pub fn search(&mut self, board: &BitBoard) -> Result<usize> {
        ensure_in_progress(board)?;

        let tree = self.grow(board);
        let iterations = self.iterations;

        // most visits wins, ties go to the more central column
        let mut best: Option<&Node> = None;
        for column in MOVE_ORDER.iter() {
            let child = tree[0]
                .children
                .iter()
                .map(|&child| &tree[child])
                .find(|child| child.column == *column);
            if let Some(child) = child {
                if best.map_or(true, |best| child.visits > best.visits) {
                    best = Some(child);
                }
            }
        }
        let best = best.ok_or(Error::InvalidState)?;
        debug!(
            "mcts picked column {} after {} iterations ({} visits, mean reward {:.3})",
            best.column + 1,
            iterations,
            best.visits,
            best.reward / best.visits as f64
        );
        Ok(best.column)
    }
}

impl Default for MctsSolver {
    fn default() -> Self {
        Self::new(MctsConfig::default())
    }
}

impl Player for MctsSolver {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        self.search(board)
    }

    fn name(&self) -> &str {
        "mcts"
    }
}
