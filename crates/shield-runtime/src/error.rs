use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session store is full: {max} sessions")]
    OutOfMemory { max: usize },

    #[error("blocklist io failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
