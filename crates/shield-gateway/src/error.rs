use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("zone error: {0}")]
    Zone(#[from] shield_policy::PolicyError),

    #[error("pattern error: {0}")]
    Pattern(#[from] shield_pattern::PatternError),

    #[error("scanner error: {0}")]
    Scanner(#[from] shield_scanner::ScannerError),

    #[error("runtime error: {0}")]
    Runtime(#[from] shield_runtime::RuntimeError),

    #[error("memory error: {0}")]
    Memory(#[from] shield_memory::MemoryError),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("signature sync rejected: {0}")]
    SyncRejected(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
