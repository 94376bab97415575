use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must be a non-empty square")]
    InvalidBoardShape,
    #[error("Tile values must be zero or a power of two")]
    InvalidTile,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("A move is still being processed")]
    MoveInProgress,
}

pub type Result<T> = core::result::Result<T, GameError>;
