use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("adaptive memory capacity exceeded: {cap}")]
    CapacityExceeded { cap: usize },

    #[error("adaptive memory file corrupt: {0}")]
    ParseFailure(String),

    #[error("adaptive memory io failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
