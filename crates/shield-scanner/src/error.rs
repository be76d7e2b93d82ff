use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScannerError {
    #[error("scan input was empty")]
    InvalidInput,

    #[error("scan input truncated from {original} to {limit} bytes")]
    Truncated { original: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, ScannerError>;
