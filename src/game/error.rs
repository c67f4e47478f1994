//! Errors raised while assembling a match

/// Construction-time failures. A running world never produces these.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Invalid tuning: {0}")]
    InvalidTuning(&'static str),

    #[error("Invalid obstacle map: {0}")]
    InvalidMap(String),

    #[error("Failed to read obstacle map: {0}")]
    MapIo(#[from] std::io::Error),

    #[error("Match rules produced an empty roster")]
    EmptyRoster,
}

pub type Result<T> = std::result::Result<T, GameError>;
