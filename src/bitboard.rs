//! Compact board representation for Connect 4
//!
//! Each column occupies `HEIGHT + 1` bits of a `u64`, bottom row first; the extra
//! bit on top of every column stays clear so shifted alignments never wrap into
//! the next column.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, MoveError, Result};
use crate::movegen::Moves;
use crate::{HEIGHT, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// One of the two players; `One` always moves first and is drawn as `X`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Side::One => 'X',
            Side::Two => 'O',
        }
    }
}

/// The state of a game as seen from the board alone
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Player1Win,
    Player2Win,
    Tie,
    InProgress,
}

impl Outcome {
    pub fn winner(&self) -> Option<Side> {
        match self {
            Outcome::Player1Win => Some(Side::One),
            Outcome::Player2Win => Some(Side::Two),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Checks a stone mask for four aligned stones in any direction
fn alignment(pos: u64) -> bool {
    // horizontal: mark all runs of 2, then look for runs of 2 * (runs of 2)
    let mut m = pos & (pos >> (HEIGHT + 1));
    if m & (m >> (2 * (HEIGHT + 1))) != 0 {
        return true;
    }

    // diagonal /
    m = pos & (pos >> HEIGHT);
    if m & (m >> (2 * HEIGHT)) != 0 {
        return true;
    }

    // diagonal \
    m = pos & (pos >> (HEIGHT + 2));
    if m & (m >> (2 * (HEIGHT + 2))) != 0 {
        return true;
    }

    // vertical
    m = pos & (pos >> 1);
    m & (m >> 2) != 0
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitBoard {
    // mask of the current player's tiles
    player_mask: u64,
    // mask of all tiles
    board_mask: u64,
    heights: [u8; WIDTH],
    num_moves: usize,
}

impl BitBoard {
    pub fn new() -> Self {
        Self {
            player_mask: 0,
            board_mask: 0,
            heights: [0; WIDTH],
            num_moves: 0,
        }
    }

    /// Builds a position from a string of 1-indexed column digits, e.g. `"4453"`
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    if board.outcome().is_terminal() {
                        return Err(Error::InvalidState);
                    }
                    board.play(column - 1)?;
                }
                _ => {
                    return Err(Error::Parse(format!(
                        "could not parse '{}' as a valid move",
                        column_char
                    )))
                }
            }
        }
        Ok(board)
    }

    pub fn top_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    pub fn bottom_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    /// Mask of the stones belonging to the player to move
    pub fn player_mask(&self) -> u64 {
        self.player_mask
    }

    pub fn board_mask(&self) -> u64 {
        self.board_mask
    }

    pub fn side_mask(&self, side: Side) -> u64 {
        if side == self.side_to_move() {
            self.player_mask
        } else {
            self.player_mask ^ self.board_mask
        }
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    /// Number of stones in `column`, `None` outside the board
    pub fn height(&self, column: usize) -> Option<usize> {
        self.heights.get(column).map(|&height| height as usize)
    }

    pub fn side_to_move(&self) -> Side {
        if self.num_moves % 2 == 0 {
            Side::One
        } else {
            Side::Two
        }
    }

    pub fn playable(&self, column: usize) -> bool {
        column < WIDTH && Self::top_mask(column) & self.board_mask == 0
    }

    /// Drops a stone of the player to move into `column`
    ///
    /// A full or out-of-range column is rejected and the board is left untouched.
    pub fn play(&mut self, column: usize) -> Result<()> {
        if column >= WIDTH {
            return Err(Error::InvalidMove {
                column,
                reason: MoveError::OutOfRange,
            });
        }
        if !self.playable(column) {
            return Err(Error::InvalidMove {
                column,
                reason: MoveError::Full,
            });
        }
        self.push(column);
        Ok(())
    }

    /// Plays a column already known to be legal
    pub(crate) fn push(&mut self, column: usize) {
        debug_assert!(self.playable(column));
        let move_bitmap = (self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column);
        // switch the current player
        self.player_mask ^= self.board_mask;
        // add a cell of the previous player to the correct column
        self.board_mask |= move_bitmap;
        self.heights[column] += 1;
        self.num_moves += 1;
    }

    /// Returns a copy of the board with a known-legal column played
    pub(crate) fn after(&self, column: usize) -> Self {
        let mut next = *self;
        next.push(column);
        next
    }

    /// Legal columns in ascending order, empty once the board is full
    pub fn legal_moves(&self) -> Moves {
        Moves::ascending(self)
    }

    pub fn possible_moves(&self) -> u64 {
        (self.board_mask + static_masks::bottom_mask()) & static_masks::full_board_mask()
    }

    /// Moves that do not hand the opponent a win on the next ply
    pub fn non_losing_moves(&self) -> u64 {
        let mut possible_moves = self.possible_moves();
        let opponent_winning_positions = self.opponent_winning_positions();
        let forced_moves = possible_moves & opponent_winning_positions;

        if forced_moves != 0 {
            // if more than one forced move exists, you can't prevent the opponent winning
            if forced_moves & (forced_moves - 1) != 0 {
                return 0;
            } else {
                possible_moves = forced_moves
            }
        }
        // avoid playing below an opponent's winning move
        possible_moves & !(opponent_winning_positions >> 1)
    }

    // open squares that would complete an alignment for the opponent
    pub fn opponent_winning_positions(&self) -> u64 {
        let opp_mask = self.player_mask ^ self.board_mask;
        self.winning_positions(opp_mask)
    }

    pub fn own_winning_positions(&self) -> u64 {
        self.winning_positions(self.player_mask)
    }

    fn winning_positions(&self, player_mask: u64) -> u64 {
        // vertical
        // find the top ends of 3-alignemnts
        let mut r = (player_mask << 1) & (player_mask << 2) & (player_mask << 3);

        // horizontal
        let mut p = (player_mask << (HEIGHT + 1)) & (player_mask << (2 * (HEIGHT + 1)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 1)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 1));

        p = (player_mask >> (HEIGHT + 1)) & (player_mask >> (2 * (HEIGHT + 1)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 1)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 1));

        // diagonal /
        p = (player_mask << HEIGHT) & (player_mask << (2 * HEIGHT));
        r |= p & (player_mask << (3 * HEIGHT));
        r |= p & (player_mask >> HEIGHT);

        p = (player_mask >> HEIGHT) & (player_mask >> (2 * HEIGHT));
        r |= p & (player_mask >> (3 * HEIGHT));
        r |= p & (player_mask << HEIGHT);

        // diagonal \
        p = (player_mask << (HEIGHT + 2)) & (player_mask << (2 * (HEIGHT + 2)));
        r |= p & (player_mask << (3 * (HEIGHT + 2)));
        r |= p & (player_mask >> (HEIGHT + 2));

        p = (player_mask >> (HEIGHT + 2)) & (player_mask >> (2 * (HEIGHT + 2)));
        r |= p & (player_mask >> (3 * (HEIGHT + 2)));
        r |= p & (player_mask << (HEIGHT + 2));

        r & (static_masks::full_board_mask() ^ self.board_mask)
    }

    /// Number of open 3-alignment ends the player to move would own after `candidate`
    pub fn move_score(&self, candidate: u64) -> i32 {
        self.winning_positions(self.player_mask | candidate)
            .count_ones() as i32
    }

    /// Would playing `column` win the game for the player to move?
    pub fn check_winning_move(&self, column: usize) -> bool {
        let pos = self.player_mask
            | ((self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column));
        alignment(pos)
    }

    /// Fast outcome check, constant time regardless of how full the board is
    ///
    /// Every line of both players is tested at once with the shift test rather
    /// than only the lines through the last stone. On boards built by `play`
    /// the answer is the same, since a new line always passes through the stone
    /// that completed it, and boards read with `FromStr` have no last stone.
    pub fn outcome(&self) -> Outcome {
        let one = self.side_mask(Side::One);
        if alignment(one) {
            Outcome::Player1Win
        } else if alignment(one ^ self.board_mask) {
            Outcome::Player2Win
        } else if self.board_mask == static_masks::full_board_mask() {
            Outcome::Tie
        } else {
            Outcome::InProgress
        }
    }

    /// Scans every 4-cell window on the board; the reference for `outcome`
    pub fn outcome_full_scan(&self) -> Outcome {
        const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        let mut won = [false; 2];
        for column in 0..WIDTH {
            for row in 0..HEIGHT {
                let side = match self.cell(column, row) {
                    Some(side) => side,
                    None => continue,
                };
                for &(dc, dr) in DIRECTIONS.iter() {
                    let line = (1..4).all(|step| {
                        let c = column as i32 + dc * step;
                        let r = row as i32 + dr * step;
                        c >= 0
                            && c < WIDTH as i32
                            && r >= 0
                            && r < HEIGHT as i32
                            && self.cell(c as usize, r as usize) == Some(side)
                    });
                    if line {
                        won[side as usize] = true;
                    }
                }
            }
        }

        let filled = (0..WIDTH).all(|column| self.cell(column, HEIGHT - 1).is_some());
        match won {
            [true, _] => Outcome::Player1Win,
            [false, true] => Outcome::Player2Win,
            _ if filled => Outcome::Tie,
            _ => Outcome::InProgress,
        }
    }

    /// Owner of the cell at `column`, `row` (row 0 is the bottom)
    pub fn cell(&self, column: usize, row: usize) -> Option<Side> {
        let bit = 1 << (column * (HEIGHT + 1) + row);
        if self.board_mask & bit == 0 {
            None
        } else if self.side_mask(Side::One) & bit != 0 {
            Some(Side::One)
        } else {
            Some(Side::Two)
        }
    }

    // key for transposition table
    pub fn key(&self) -> u64 {
        self.player_mask + self.board_mask
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            write!(f, "|")?;
            for column in 0..WIDTH {
                let marker = self.cell(column, row).map(Side::marker).unwrap_or(' ');
                write!(f, "{}|", marker)?;
            }
            writeln!(f)?;
        }
        write!(f, "|")?;
        for column in 1..=WIDTH {
            write!(f, "{}|", column)?;
        }
        writeln!(f)
    }
}

impl FromStr for BitBoard {
    type Err = Error;

    /// Parses the layout produced by `Display`; the player to move is inferred
    /// from the number of stones
    fn from_str(s: &str) -> Result<Self> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() != HEIGHT + 1 {
            return Err(Error::Parse(format!(
                "expected {} lines, found {}",
                HEIGHT + 1,
                lines.len()
            )));
        }

        let footer: String = std::iter::once("|".to_string())
            .chain((1..=WIDTH).map(|column| format!("{}|", column)))
            .collect();
        if lines[HEIGHT] != footer {
            return Err(Error::Parse(format!("invalid footer '{}'", lines[HEIGHT])));
        }

        let mut masks = [0u64; 2];
        for (i, line) in lines[..HEIGHT].iter().enumerate() {
            let row = HEIGHT - 1 - i;
            let chars: Vec<char> = line.chars().collect();
            if chars.len() != 2 * WIDTH + 1 {
                return Err(Error::Parse(format!("row '{}' must have {} cells", line, WIDTH)));
            }
            for (idx, &c) in chars.iter().enumerate() {
                if idx % 2 == 0 {
                    if c != '|' {
                        return Err(Error::Parse(format!("expected '|' in row '{}'", line)));
                    }
                    continue;
                }
                let bit = 1 << ((idx / 2) * (HEIGHT + 1) + row);
                match c {
                    'X' => masks[0] |= bit,
                    'O' => masks[1] |= bit,
                    ' ' => {}
                    other => {
                        return Err(Error::Parse(format!("unknown cell marker '{}'", other)))
                    }
                }
            }
        }

        let board_mask = masks[0] | masks[1];
        let mut heights = [0u8; WIDTH];
        for (column, height) in heights.iter_mut().enumerate() {
            let column_bits = (board_mask & Self::column_mask(column)) >> (column * (HEIGHT + 1));
            // stones must be stacked from the bottom without gaps
            if column_bits & (column_bits + 1) != 0 {
                return Err(Error::Parse(format!("floating stone in column {}", column + 1)));
            }
            *height = column_bits.count_ones() as u8;
        }

        let num_moves = board_mask.count_ones() as usize;
        let player_mask = if num_moves % 2 == 0 { masks[0] } else { masks[1] };
        Ok(Self {
            player_mask,
            board_mask,
            heights,
            num_moves,
        })
    }
}
