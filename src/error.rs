use crate::WIDTH;

/// Errors raised by the board, the players and the game runner
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid move, column {} {reason}", .column + 1)]
    InvalidMove { column: usize, reason: MoveError },

    #[error("Invalid state, the game is already over")]
    InvalidState,

    #[error("could not parse board: {0}")]
    Parse(String),

    #[error("unknown player specification '{0}'")]
    InvalidPlayer(String),
}

/// Why a column was rejected by `BitBoard::play`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    OutOfRange,
    Full,
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::OutOfRange => {
                write!(f, "out of range, columns must be between 1 and {}", WIDTH)
            }
            MoveError::Full => write!(f, "full"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_move_display() {
        let err = Error::InvalidMove {
            column: 3,
            reason: MoveError::Full,
        };
        assert_eq!(err.to_string(), "Invalid move, column 4 full");

        let err = Error::InvalidMove {
            column: 9,
            reason: MoveError::OutOfRange,
        };
        assert_eq!(
            err.to_string(),
            "Invalid move, column 10 out of range, columns must be between 1 and 7"
        );
    }

    #[test]
    fn parse_error_display() {
        let err = Error::Parse("expected 7 lines, found 3".to_string());
        assert_eq!(err.to_string(), "could not parse board: expected 7 lines, found 3");
    }
}
