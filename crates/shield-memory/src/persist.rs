//! Binary persistence for the adaptive memory set.
//!
//! Layout: `magic:u32, version:u32, active_count:u32, [entry; active_count]`,
//! all little-endian. Each entry is `hash[32], severity:u8, threat_type:u8,
//! first_seen:i64, last_seen:i64, hit_count:u32, active:u8`. Writes go to a
//! sibling `.tmp` file, are flushed and fsynced, then renamed into place so
//! a crash mid-write never leaves a half-written memory file behind.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use shield_pattern::{Severity, ThreatType};

use crate::error::{MemoryError, Result};
use crate::memory::{Hash, MemoryEntry};

const MAGIC: u32 = 0x494D_454D;
const VERSION: u32 = 2;
const ENTRY_LEN: usize = 32 + 1 + 1 + 8 + 8 + 4 + 1;

fn severity_to_byte(s: Severity) -> u8 {
    match s {
        Severity::None => 0,
        Severity::Low => 1,
        Severity::Medium => 2,
        Severity::High => 3,
        Severity::Critical => 4,
    }
}

fn severity_from_byte(b: u8) -> Result<Severity> {
    Ok(match b {
        0 => Severity::None,
        1 => Severity::Low,
        2 => Severity::Medium,
        3 => Severity::High,
        4 => Severity::Critical,
        other => return Err(MemoryError::ParseFailure(format!("unknown severity byte {other}"))),
    })
}

fn threat_type_to_byte(t: ThreatType) -> u8 {
    match t {
        ThreatType::Jailbreak => 0,
        ThreatType::Injection => 1,
        ThreatType::Malware => 2,
        ThreatType::Sqli => 3,
        ThreatType::Xss => 4,
        ThreatType::PathTraversal => 5,
        ThreatType::Ssti => 6,
        ThreatType::Encoding => 7,
        ThreatType::Shell => 8,
    }
}

fn threat_type_from_byte(b: u8) -> Result<ThreatType> {
    Ok(match b {
        0 => ThreatType::Jailbreak,
        1 => ThreatType::Injection,
        2 => ThreatType::Malware,
        3 => ThreatType::Sqli,
        4 => ThreatType::Xss,
        5 => ThreatType::PathTraversal,
        6 => ThreatType::Ssti,
        7 => ThreatType::Encoding,
        8 => ThreatType::Shell,
        other => return Err(MemoryError::ParseFailure(format!("unknown threat type byte {other}"))),
    })
}

fn encode_entry(entry: &MemoryEntry, out: &mut Vec<u8>) {
    out.extend_from_slice(&entry.hash);
    out.push(severity_to_byte(entry.severity));
    out.push(threat_type_to_byte(entry.threat_type));
    out.extend_from_slice(&entry.first_seen_ts.to_le_bytes());
    out.extend_from_slice(&entry.last_seen_ts.to_le_bytes());
    out.extend_from_slice(&entry.hit_count.to_le_bytes());
    out.push(entry.active as u8);
}

fn decode_entry(buf: &[u8]) -> Result<MemoryEntry> {
    if buf.len() != ENTRY_LEN {
        return Err(MemoryError::ParseFailure("short entry record".into()));
    }
    let mut hash: Hash = [0u8; 32];
    hash.copy_from_slice(&buf[0..32]);
    let severity = severity_from_byte(buf[32])?;
    let threat_type = threat_type_from_byte(buf[33])?;
    let first_seen_ts = i64::from_le_bytes(buf[34..42].try_into().unwrap());
    let last_seen_ts = i64::from_le_bytes(buf[42..50].try_into().unwrap());
    let hit_count = u32::from_le_bytes(buf[50..54].try_into().unwrap());
    let active = buf[54] != 0;
    Ok(MemoryEntry {
        hash,
        severity,
        threat_type,
        first_seen_ts,
        last_seen_ts,
        hit_count,
        active,
    })
}

pub fn encode(entries: &[MemoryEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + entries.len() * ENTRY_LEN);
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        encode_entry(entry, &mut out);
    }
    out
}

pub fn decode(buf: &[u8]) -> Result<Vec<MemoryEntry>> {
    if buf.len() < 12 {
        return Err(MemoryError::ParseFailure("file too short".into()));
    }
    let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    if magic != MAGIC {
        return Err(MemoryError::ParseFailure(format!("bad magic {magic:#x}")));
    }
    let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(MemoryError::ParseFailure(format!("unsupported version {version}")));
    }
    let count = u32::from_le_bytes(buf[8..12].try_into().unwrap()) as usize;
    let body = &buf[12..];
    if body.len() != count * ENTRY_LEN {
        return Err(MemoryError::ParseFailure("entry count does not match file length".into()));
    }
    body.chunks_exact(ENTRY_LEN).map(decode_entry).collect()
}

pub fn save(path: &Path, entries: &[MemoryEntry]) -> Result<()> {
    let bytes = encode(entries);
    let tmp_path = path.with_extension("tmp");
    let mut tmp = File::create(&tmp_path)?;
    tmp.write_all(&bytes)?;
    tmp.flush()?;
    tmp.sync_all()?;
    drop(tmp);
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<MemoryEntry>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    decode(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Vec<MemoryEntry> {
        vec![
            MemoryEntry {
                hash: [7u8; 32],
                severity: Severity::High,
                threat_type: ThreatType::Malware,
                first_seen_ts: 1000,
                last_seen_ts: 2000,
                hit_count: 3,
                active: true,
            },
            MemoryEntry {
                hash: [9u8; 32],
                severity: Severity::Critical,
                threat_type: ThreatType::Sqli,
                first_seen_ts: 10,
                last_seen_ts: 20,
                hit_count: 1,
                active: false,
            },
        ]
    }

    #[test]
    fn encode_decode_round_trips() {
        let entries = sample();
        let bytes = encode(&entries);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn save_load_round_trips_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.bin");
        let entries = sample();
        save(&path, &entries).unwrap();
        let first = fs::read(&path).unwrap();
        save(&path, &entries).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(load(&path).unwrap(), entries);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encode(&sample());
        bytes[0] ^= 0xFF;
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn truncated_file_is_rejected() {
        let mut bytes = encode(&sample());
        bytes.truncate(bytes.len() - 1);
        assert!(decode(&bytes).is_err());
    }
}
