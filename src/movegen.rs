//! Legal move enumeration
//!
//! Orderings only affect how early a search can prune; every solver must reach
//! the same decision whatever order it is handed.

use crate::{bitboard::BitBoard, WIDTH};

/// Returns a slice ordering the columns from the middle outwards, left before
/// right, as the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) - (i % 2) * (i / 2 + 1) + (1 - i % 2) * (i / 2);
        i += 1;
    }
    move_order
}

pub const MOVE_ORDER: [usize; WIDTH] = move_order();

/// A fixed-capacity list of columns, consumed front to back
#[derive(Copy, Clone, Debug)]
pub struct Moves {
    columns: [usize; WIDTH],
    len: usize,
    next: usize,
}

impl Moves {
    fn empty() -> Self {
        Self {
            columns: [0; WIDTH],
            len: 0,
            next: 0,
        }
    }

    fn push(&mut self, column: usize) {
        self.columns[self.len] = column;
        self.len += 1;
    }

    pub fn ascending(board: &BitBoard) -> Self {
        Self::in_order(board, 0..WIDTH)
    }

    pub fn center_first(board: &BitBoard) -> Self {
        Self::in_order(board, MOVE_ORDER.iter().copied())
    }

    fn in_order<I: Iterator<Item = usize>>(board: &BitBoard, order: I) -> Self {
        let mut moves = Self::empty();
        for column in order.filter(|&column| board.playable(column)) {
            moves.push(column);
        }
        moves
    }

    /// Remaining columns
    pub fn as_slice(&self) -> &[usize] {
        &self.columns[self.next..self.len]
    }

    pub fn contains(&self, column: usize) -> bool {
        self.as_slice().contains(&column)
    }

    pub fn len(&self) -> usize {
        self.len - self.next
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves `column` to the front if it is present
    pub fn promote(&mut self, column: usize) {
        if let Some(pos) = self.as_slice().iter().position(|&c| c == column) {
            self.columns[self.next..=self.next + pos].rotate_right(1);
        }
    }
}

impl Iterator for Moves {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.len {
            self.next += 1;
            Some(self.columns[self.next - 1])
        } else {
            None
        }
    }
}

struct MoveSorter {
    size: usize,
    // column and score
    moves: [(usize, i32); WIDTH],
}

impl MoveSorter {
    pub fn new() -> Self {
        Self {
            size: 0,
            moves: [(0, 0); WIDTH],
        }
    }
    pub fn push(&mut self, column: usize, score: i32) {
        let mut pos = self.size;
        self.size += 1;
        while pos != 0 && self.moves[pos - 1].1 > score {
            self.moves[pos] = self.moves[pos - 1];
            pos -= 1;
        }
        self.moves[pos] = (column, score);
    }
}

impl Iterator for MoveSorter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        match self.size {
            0 => None,
            _ => {
                self.size -= 1;
                Some(self.moves[self.size].0)
            }
        }
    }
}

/// Legal columns sorted by the number of open alignments they create,
/// center-first among equals
pub fn threat_ordered(board: &BitBoard) -> Moves {
    let mut sorter = MoveSorter::new();
    // pushing the edges first keeps the center ahead of equally scored moves
    for &column in MOVE_ORDER.iter().rev() {
        if board.playable(column) {
            let candidate = (board.board_mask() + BitBoard::bottom_mask(column))
                & BitBoard::column_mask(column);
            sorter.push(column, board.move_score(candidate));
        }
    }
    let mut moves = Moves::empty();
    for column in sorter {
        moves.push(column);
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    #[test]
    fn center_out_order() {
        assert_eq!(MOVE_ORDER, [3, 2, 4, 1, 5, 0, 6]);
    }

    #[test]
    fn orderings_cover_the_same_columns() -> Result<()> {
        let board = BitBoard::from_moves("444444333")?;
        let ascending: Vec<usize> = board.legal_moves().collect();
        assert_eq!(ascending, vec![0, 1, 2, 4, 5, 6]);

        let center: Vec<usize> = Moves::center_first(&board).collect();
        assert_eq!(center, vec![2, 4, 1, 5, 0, 6]);

        let mut sorted: Vec<usize> = threat_ordered(&board).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, ascending);
        Ok(())
    }

    #[test]
    fn threat_order_prefers_open_alignments() -> Result<()> {
        // player one holds columns 3 and 4 of the bottom row
        let board = BitBoard::from_moves("3344")?;
        let first = threat_ordered(&board).next();
        assert!(first == Some(1) || first == Some(4));
        Ok(())
    }

    #[test]
    fn promote_moves_column_to_front() {
        let board = BitBoard::new();
        let mut moves = Moves::center_first(&board);
        moves.promote(5);
        let order: Vec<usize> = moves.collect();
        assert_eq!(order, vec![5, 3, 2, 4, 1, 0, 6]);
    }
}
