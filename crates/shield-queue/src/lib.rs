//! Bounded agent-to-hive telemetry queue plus the binary wire protocol the
//! two sides speak over it.

mod error;
mod queue;
mod wire;

pub use error::{QueueError, Result, WireError};
pub use queue::{bounded, QueueConsumer, QueueProducer};
pub use wire::{
    Frame, Header, MessageType, SequenceCounter, ThreatPayload, HEADER_LEN,
    HEARTBEAT_INTERVAL_SECS, MAX_PAYLOAD_LEN, MAX_SIGNATURE_LEN, PROTOCOL_VERSION,
};
