use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern compile failed for {kind:?}: {reason}")]
    ParseFailure { kind: crate::pattern::PatternKind, reason: String },

    #[error("pattern bytes empty")]
    InvalidInput,

    #[error("duplicate pattern id {0}")]
    AlreadyExists(u64),
}

pub type Result<T> = std::result::Result<T, PatternError>;
