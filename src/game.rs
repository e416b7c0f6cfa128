//! Playing whole games between two players, one at a time or in bulk

use log::{debug, trace};
use rayon::prelude::*;

use crate::bitboard::{BitBoard, Outcome, Side};
use crate::config::PlayerKind;
use crate::error::Result;
use crate::player::{ensure_in_progress, Player};

/// Everything that happened in one game
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRecord {
    /// the columns played, in order, starting from the initial board
    pub moves: Vec<usize>,
    pub board: BitBoard,
    pub outcome: Outcome,
}

/// Plays a game from the empty board, `first` moving first
pub fn play_game<'a>(
    first: &mut (dyn Player + 'a),
    second: &mut (dyn Player + 'a),
) -> Result<GameRecord> {
    play_game_from(BitBoard::new(), first, second)
}

/// Plays out `board` until it is decided
///
/// `first` moves whenever player one is to move and `second` whenever player
/// two is, whatever the ply of the starting board. A column a player returns
/// that cannot be played ends the game with `Error::InvalidMove`.
pub fn play_game_from<'a>(
    mut board: BitBoard,
    first: &mut (dyn Player + 'a),
    second: &mut (dyn Player + 'a),
) -> Result<GameRecord> {
    ensure_in_progress(&board)?;

    let mut moves = Vec::new();
    let outcome = loop {
        let outcome = board.outcome();
        if outcome.is_terminal() {
            break outcome;
        }
        let player = match board.side_to_move() {
            Side::One => &mut *first,
            Side::Two => &mut *second,
        };
        let column = player.choose_move(&board)?;
        trace!("{} plays column {}", player.name(), column + 1);
        board.play(column)?;
        moves.push(column);
    };

    debug!(
        "{} vs {} ended {:?} after {} moves",
        first.name(),
        second.name(),
        outcome,
        moves.len()
    );
    Ok(GameRecord {
        moves,
        board,
        outcome,
    })
}

/// Tally of a match, from the point of view of one of the players
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
}

impl MatchResult {
    pub fn games(&self) -> usize {
        self.wins + self.losses + self.ties
    }

    /// Fraction of games won, counting a tie as half a win
    pub fn win_rate(&self) -> f64 {
        if self.games() == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.ties as f64) / self.games() as f64
    }

    fn record(&mut self, winner: Option<Side>, us: Side) {
        match winner {
            Some(side) if side == us => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.ties += 1,
        }
    }
}

/// Plays `games` independent games between `a` and `b` in parallel and returns
/// the result for `a`
///
/// `a` moves first in the even-numbered games and `b` in the odd ones. Every
/// game builds its own players; with a `seed` the whole match is reproducible.
/// `on_game` is called from the worker threads as each game finishes.
pub fn run_match<F>(
    a: &PlayerKind,
    b: &PlayerKind,
    games: usize,
    seed: Option<u64>,
    on_game: F,
) -> Result<MatchResult>
where
    F: Fn() + Sync,
{
    let results = (0..games)
        .into_par_iter()
        .map(|game| -> Result<(Option<Side>, Side)> {
            let game_seed =
                |offset: u64| seed.map(|seed| seed.wrapping_add(2 * game as u64 + offset));
            let mut player_a = a.build(game_seed(0));
            let mut player_b = b.build(game_seed(1));

            let (record, a_side) = if game % 2 == 0 {
                (play_game(&mut player_a, &mut player_b)?, Side::One)
            } else {
                (play_game(&mut player_b, &mut player_a)?, Side::Two)
            };
            on_game();
            Ok((record.outcome.winner(), a_side))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut result = MatchResult::default();
    for (winner, a_side) in results {
        result.record(winner, a_side);
    }
    debug!("{} vs {}: {:?}", a, b, result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, MoveError};
    use crate::player::RandomPlayer;
    use crate::tactical::OneMoveSolver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always plays the same column, legal or not
    struct Stubborn(usize);

    impl Player for Stubborn {
        fn choose_move(&mut self, _board: &BitBoard) -> Result<usize> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "stubborn"
        }
    }

    #[test]
    fn records_a_complete_game() -> Result<()> {
        let record = play_game(&mut RandomPlayer::seeded(1), &mut RandomPlayer::seeded(2))?;
        assert!(record.outcome.is_terminal());
        assert_eq!(record.moves.len(), record.board.num_moves());

        let replayed = BitBoard::from_moves(
            record
                .moves
                .iter()
                .map(|column| char::from(b'1' + *column as u8))
                .collect::<String>(),
        )?;
        assert_eq!(replayed, record.board);
        Ok(())
    }

    #[test]
    fn stubborn_players_run_into_a_full_column() {
        // both stack column 1 until it runs out of room; nobody can connect four
        let result = play_game(&mut Stubborn(0), &mut Stubborn(0));
        assert_eq!(
            result,
            Err(Error::InvalidMove {
                column: 0,
                reason: MoveError::Full
            })
        );
    }

    #[test]
    fn the_first_player_wins_a_race() -> Result<()> {
        let record = play_game(&mut Stubborn(0), &mut Stubborn(1))?;
        assert_eq!(record.outcome, Outcome::Player1Win);
        assert_eq!(record.moves, vec![0, 1, 0, 1, 0, 1, 0]);
        Ok(())
    }

    #[test]
    fn games_resume_from_a_position() -> Result<()> {
        // player two to move, and must block column 4
        let board = BitBoard::from_moves("1122337")?;
        let record = play_game_from(board, &mut OneMoveSolver, &mut OneMoveSolver)?;
        assert_eq!(record.moves[0], 3);
        assert_eq!(record.board.num_moves(), 7 + record.moves.len());
        assert_eq!(record.board.cell(3, 0), Some(Side::Two));

        let finished = BitBoard::from_moves("1212121")?;
        assert_eq!(
            play_game_from(finished, &mut OneMoveSolver, &mut OneMoveSolver),
            Err(Error::InvalidState)
        );
        Ok(())
    }

    #[test]
    fn matches_are_counted_for_the_first_named_player() -> Result<()> {
        let finished = AtomicUsize::new(0);
        let result = run_match(&PlayerKind::TwoMove, &PlayerKind::Random, 20, Some(3), || {
            finished.fetch_add(1, Ordering::Relaxed);
        })?;
        assert_eq!(result.games(), 20);
        assert_eq!(finished.load(Ordering::Relaxed), 20);
        assert!(result.wins > result.losses);

        let again = run_match(&PlayerKind::TwoMove, &PlayerKind::Random, 20, Some(3), || {})?;
        assert_eq!(again, result);
        Ok(())
    }

    #[test]
    fn win_rate_counts_ties_as_half() {
        let result = MatchResult {
            wins: 3,
            losses: 1,
            ties: 2,
        };
        assert_eq!(result.win_rate(), 4.0 / 6.0);
        assert_eq!(MatchResult::default().win_rate(), 0.0);
    }
}
