//! Agent<->Hive binary protocol: a fixed 32-byte header, hand-encoded with
//! `to_le_bytes`/`from_le_bytes` rather than through a general-purpose
//! serializer, since this one boundary needs an exact, stable byte layout.

use crate::error::{WireError, Result};

pub const HEADER_LEN: usize = 32;
pub const MAX_PAYLOAD_LEN: usize = 4096;
pub const MAX_SIGNATURE_LEN: usize = 256;
pub const PROTOCOL_VERSION: u8 = 1;
pub const HEARTBEAT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Register,
    RegisterAck,
    Heartbeat,
    Threat,
    Stats,
    SignatureRequest,
    Signature,
}

impl MessageType {
    fn to_byte(self) -> u8 {
        match self {
            MessageType::Register => 1,
            MessageType::RegisterAck => 2,
            MessageType::Heartbeat => 3,
            MessageType::Threat => 4,
            MessageType::Stats => 5,
            MessageType::SignatureRequest => 6,
            MessageType::Signature => 7,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            1 => MessageType::Register,
            2 => MessageType::RegisterAck,
            3 => MessageType::Heartbeat,
            4 => MessageType::Threat,
            5 => MessageType::Stats,
            6 => MessageType::SignatureRequest,
            7 => MessageType::Signature,
            other => return Err(WireError::UnknownMessageType(other).into()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub msg_type: MessageType,
    pub flags: u16,
    pub length: u32,
    pub timestamp: u64,
    pub agent_id: u64,
    pub sequence: u32,
    pub checksum: u32,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = self.version;
        out[1] = self.msg_type.to_byte();
        out[2..4].copy_from_slice(&self.flags.to_le_bytes());
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out[8..16].copy_from_slice(&self.timestamp.to_le_bytes());
        out[16..24].copy_from_slice(&self.agent_id.to_le_bytes());
        out[24..28].copy_from_slice(&self.sequence.to_le_bytes());
        out[28..32].copy_from_slice(&self.checksum.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HEADER_LEN {
            return Err(WireError::BadHeaderLength(bytes.len()).into());
        }
        Ok(Self {
            version: bytes[0],
            msg_type: MessageType::from_byte(bytes[1])?,
            flags: u16::from_le_bytes([bytes[2], bytes[3]]),
            length: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            timestamp: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            agent_id: u64::from_le_bytes(bytes[16..24].try_into().unwrap()),
            sequence: u32::from_le_bytes(bytes[24..28].try_into().unwrap()),
            checksum: u32::from_le_bytes(bytes[28..32].try_into().unwrap()),
        })
    }
}

/// A complete header + payload frame as it goes over the wire.
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(msg_type: MessageType, agent_id: u64, sequence: u32, timestamp: u64, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(WireError::PayloadTooLarge(payload.len()).into());
        }
        let checksum = crc32fast::hash(&payload);
        let header = Header {
            version: PROTOCOL_VERSION,
            msg_type,
            flags: 0,
            length: payload.len() as u32,
            timestamp,
            agent_id,
            sequence,
            checksum,
        };
        Ok(Self { header, payload })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::BadHeaderLength(bytes.len()).into());
        }
        let header = Header::decode(&bytes[..HEADER_LEN])?;
        let payload = bytes[HEADER_LEN..].to_vec();
        if payload.len() != header.length as usize {
            return Err(WireError::LengthMismatch { declared: header.length, actual: payload.len() }.into());
        }
        let actual = crc32fast::hash(&payload);
        if actual != header.checksum {
            return Err(WireError::ChecksumMismatch { expected: header.checksum, actual }.into());
        }
        Ok(Self { header, payload })
    }
}

/// Monotonic per-agent sequence numbers for outgoing frames.
pub struct SequenceCounter(std::sync::atomic::AtomicU32);

impl SequenceCounter {
    pub fn new() -> Self {
        Self(std::sync::atomic::AtomicU32::new(0))
    }

    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// The `THREAT` message payload: severity, threat type, process/user id, and
/// a bounded detection signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatPayload {
    pub severity: u8,
    pub threat_type: u8,
    pub pid: u32,
    pub uid: u32,
    pub signature: Vec<u8>,
}

impl ThreatPayload {
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.signature.len() > MAX_SIGNATURE_LEN {
            return Err(WireError::SignatureTooLarge(self.signature.len()).into());
        }
        let mut out = Vec::with_capacity(2 + 8 + 2 + self.signature.len());
        out.push(self.severity);
        out.push(self.threat_type);
        out.extend_from_slice(&self.pid.to_le_bytes());
        out.extend_from_slice(&self.uid.to_le_bytes());
        out.extend_from_slice(&(self.signature.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.signature);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 12 {
            return Err(WireError::BadHeaderLength(bytes.len()).into());
        }
        let severity = bytes[0];
        let threat_type = bytes[1];
        let pid = u32::from_le_bytes(bytes[2..6].try_into().unwrap());
        let uid = u32::from_le_bytes(bytes[6..10].try_into().unwrap());
        let sig_len = u16::from_le_bytes(bytes[10..12].try_into().unwrap()) as usize;
        if sig_len > MAX_SIGNATURE_LEN {
            return Err(WireError::SignatureTooLarge(sig_len).into());
        }
        let signature = bytes[12..12 + sig_len].to_vec();
        Ok(Self { severity, threat_type, pid, uid, signature })
    }
}
