//! Cheap fixed-depth players: take a win, stop a loss, otherwise play safe
//!
//! Neither player searches past its lookahead or keeps any state, so both are
//! usable as fallbacks inside deeper searches.

use log::trace;

use crate::bitboard::BitBoard;
use crate::error::Result;
use crate::movegen::MOVE_ORDER;
use crate::player::{ensure_in_progress, Player};

fn first_in_mask(mask: u64) -> Option<usize> {
    MOVE_ORDER
        .iter()
        .copied()
        .find(|&column| mask & BitBoard::column_mask(column) != 0)
}

/// First column, center-out, that wins on the spot
pub fn winning_move(board: &BitBoard) -> Option<usize> {
    MOVE_ORDER
        .iter()
        .copied()
        .find(|&column| board.playable(column) && board.check_winning_move(column))
}

/// First column, center-out, where the opponent would win on their next ply
pub fn blocking_move(board: &BitBoard) -> Option<usize> {
    first_in_mask(board.opponent_winning_positions() & board.possible_moves())
}

/// A safe column after which every opponent reply leaves a win on the spot
pub fn forcing_move(board: &BitBoard) -> Option<usize> {
    let safe = board.non_losing_moves();
    MOVE_ORDER.iter().copied().find(|&column| {
        safe & BitBoard::column_mask(column) != 0 && forces_win(&board.after(column))
    })
}

// the opponent is to move on `board`
fn forces_win(board: &BitBoard) -> bool {
    let mut replies = board.legal_moves();
    !replies.is_empty()
        && replies.all(|reply| {
            !board.check_winning_move(reply) && winning_move(&board.after(reply)).is_some()
        })
}

fn first_legal(board: &BitBoard) -> usize {
    // callers have checked that the game is still running, so a column is free
    first_in_mask(board.possible_moves()).unwrap_or(MOVE_ORDER[0])
}

/// Wins in one ply if it can, otherwise blocks the opponent's win in one ply,
/// otherwise plays the first column center-out that does not hand the opponent
/// a win, and the first legal column when there is none
#[derive(Copy, Clone, Debug, Default)]
pub struct OneMoveSolver;

impl OneMoveSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Player for OneMoveSolver {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        ensure_in_progress(board)?;
        let column = winning_move(board)
            .or_else(|| blocking_move(board))
            .or_else(|| first_in_mask(board.non_losing_moves()))
            .unwrap_or_else(|| first_legal(board));
        trace!("one-move solver picked column {}", column + 1);
        Ok(column)
    }

    fn name(&self) -> &str {
        "one-move"
    }
}

/// Extends the one-move checks with a ply of opponent-then-self lookahead
///
/// After wins and blocks it looks for a move every reply to which can be
/// answered with a win, then for any move that does not hand the opponent a
/// win, and only then settles for the first legal column.
#[derive(Copy, Clone, Debug, Default)]
pub struct TwoMoveSolver;

impl TwoMoveSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Player for TwoMoveSolver {
    fn choose_move(&mut self, board: &BitBoard) -> Result<usize> {
        ensure_in_progress(board)?;
        let column = winning_move(board)
            .or_else(|| blocking_move(board))
            .or_else(|| forcing_move(board))
            .or_else(|| first_in_mask(board.non_losing_moves()))
            .unwrap_or_else(|| first_legal(board));
        trace!("two-move solver picked column {}", column + 1);
        Ok(column)
    }

    fn name(&self) -> &str {
        "two-move"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::Outcome;
    use crate::error::Error;

    const DIAGONAL_THREAT: &str = "
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        |O|X| | | | | |
        |O|O|X| | | | |
        |X|O|O|X|X| | |
        |1|2|3|4|5|6|7|
    ";

    const ROW_THREAT: &str = "
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        | | | |O| |O| |
        | |O|X|X| |X| |
        |1|2|3|4|5|6|7|
    ";

    const MUST_BLOCK: &str = "
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        |X|X| | | | | |
        |O|O|O| | | |X|
        |1|2|3|4|5|6|7|
    ";

    const OPEN_TWO: &str = "
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        | | | | | | | |
        | | | |O|O| | |
        | | | |X|X| | |
        |1|2|3|4|5|6|7|
    ";

    #[test]
    fn one_move_solver_takes_the_win() -> Result<()> {
        for (fixture, expected) in [(DIAGONAL_THREAT, 0), (ROW_THREAT, 4)].iter() {
            let mut board: BitBoard = fixture.parse()?;
            let column = OneMoveSolver.choose_move(&board)?;
            assert_eq!(column, *expected);
            board.play(column)?;
            assert_eq!(board.outcome_full_scan(), Outcome::Player1Win);
        }
        Ok(())
    }

    #[test]
    fn both_solvers_block() -> Result<()> {
        let board: BitBoard = MUST_BLOCK.parse()?;
        assert_eq!(winning_move(&board), None);
        assert_eq!(OneMoveSolver.choose_move(&board)?, 3);
        assert_eq!(TwoMoveSolver.choose_move(&board)?, 3);
        Ok(())
    }

    #[test]
    fn two_move_solver_sets_up_a_double_threat() -> Result<()> {
        let board: BitBoard = OPEN_TWO.parse()?;
        assert_eq!(OneMoveSolver.choose_move(&board)?, 3);
        assert_eq!(TwoMoveSolver.choose_move(&board)?, 2);
        assert_eq!(forcing_move(&board), Some(2));
        Ok(())
    }

    #[test]
    fn two_move_solver_does_not_feed_the_opponent() -> Result<()> {
        // player two threatens the second row of column 5, which is not yet reachable
        let board: BitBoard = "
            | | | | | | | |
            | | | | | | | |
            | | | | | | | |
            | | | | | | | |
            |X|O|O|O| | | |
            |X|X|O|X| | | |
            |1|2|3|4|5|6|7|
        "
        .parse()?;
        assert_eq!(winning_move(&board), None);
        assert_eq!(blocking_move(&board), None);
        let column = TwoMoveSolver.choose_move(&board)?;
        assert_ne!(column, 4);
        let next = board.after(column);
        assert_eq!(winning_move(&next), None);
        Ok(())
    }

    #[test]
    fn one_move_solver_does_not_play_under_a_threat() -> Result<()> {
        // player two wins on the second row of column 4 once column 4 is started
        let board: BitBoard = "
            | | | | | | | |
            | | | | | | | |
            | | | | | | | |
            | | | | | | | |
            |O|O|O| | | | |
            |X|O|X| | |X|X|
            |1|2|3|4|5|6|7|
        "
        .parse()?;
        assert_eq!(winning_move(&board), None);
        assert_eq!(blocking_move(&board), None);
        assert_eq!(winning_move(&board.after(3)), Some(3));

        let column = OneMoveSolver.choose_move(&board)?;
        assert_eq!(column, 2);
        assert_eq!(winning_move(&board.after(column)), None);

        let column = TwoMoveSolver.choose_move(&board)?;
        assert_eq!(winning_move(&board.after(column)), None);
        Ok(())
    }

    #[test]
    fn terminal_boards_are_rejected() -> Result<()> {
        let board = BitBoard::from_moves("1212121")?;
        assert_eq!(OneMoveSolver.choose_move(&board), Err(Error::InvalidState));
        assert_eq!(TwoMoveSolver.choose_move(&board), Err(Error::InvalidState));
        Ok(())
    }
}
