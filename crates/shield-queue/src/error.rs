use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is shut down")]
    ShutDown,

    #[error("wire protocol error: {0}")]
    Wire(#[from] WireError),
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("header must be exactly 32 bytes, got {0}")]
    BadHeaderLength(usize),

    #[error("unknown message type byte {0:#x}")]
    UnknownMessageType(u8),

    #[error("payload length {declared} in header does not match {actual} bytes received")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("payload of {0} bytes exceeds the 4096-byte maximum")]
    PayloadTooLarge(usize),

    #[error("checksum mismatch: header says {expected:#x}, computed {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("threat signature of {0} bytes exceeds the 256-byte maximum")]
    SignatureTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, QueueError>;
