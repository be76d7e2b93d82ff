//! Statistical and structural heuristics that can raise (never lower) a
//! scan's severity once pattern matching has run.

use std::collections::HashMap;

use shield_pattern::Severity;

const ENTROPY_MIN_LEN: usize = 100;
const ENTROPY_THRESHOLD: f64 = 7.5;
const INVISIBLE_HIGH: usize = 5;
const INVISIBLE_MEDIUM: usize = 2;
const REPETITION_RUN_LEN: usize = 10;
const REPETITION_THRESHOLD: usize = 10;
const HEX_ESCAPE_HIGH: usize = 10;
const HEX_ESCAPE_MEDIUM: usize = 5;
const UNICODE_ESCAPE_HIGH: usize = 5;

/// Shannon entropy over the byte distribution of `bytes`, in bits per byte.
pub fn shannon_entropy(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let mut freq: HashMap<u8, usize> = HashMap::new();
    for &b in bytes {
        *freq.entry(b).or_insert(0) += 1;
    }
    let len = bytes.len() as f64;
    freq.values()
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

pub fn entropy_severity(bytes: &[u8]) -> Severity {
    if bytes.len() < ENTROPY_MIN_LEN {
        return Severity::None;
    }
    if shannon_entropy(bytes) > ENTROPY_THRESHOLD {
        Severity::Medium
    } else {
        Severity::None
    }
}

/// Counts zero-width characters, bidi overrides, and non-whitespace ASCII
/// control bytes. A lone bidi override is an immediate HIGH signal.
pub fn invisible_severity(bytes: &[u8]) -> Severity {
    let text = String::from_utf8_lossy(bytes);
    let mut count = 0usize;
    for ch in text.chars() {
        let cp = ch as u32;
        let is_bidi_override = matches!(cp, 0x202E | 0x202B);
        let is_zero_width = matches!(cp, 0x200B..=0x200F);
        let is_control = ch.is_control() && !matches!(ch, '\n' | '\r' | '\t');
        if is_bidi_override {
            return Severity::High;
        }
        if is_zero_width || is_control {
            count += 1;
        }
    }
    if count > INVISIBLE_HIGH {
        Severity::High
    } else if count > INVISIBLE_MEDIUM {
        Severity::Medium
    } else {
        Severity::None
    }
}

/// Flags a 10-byte run repeated more than ten times anywhere in `bytes`.
pub fn repetition_severity(bytes: &[u8]) -> Severity {
    if bytes.len() < REPETITION_RUN_LEN * 2 {
        return Severity::None;
    }
    let mut counts: HashMap<&[u8], usize> = HashMap::new();
    for window in bytes.windows(REPETITION_RUN_LEN) {
        let count = counts.entry(window).or_insert(0);
        *count += 1;
        if *count > REPETITION_THRESHOLD {
            return Severity::Medium;
        }
    }
    Severity::None
}

pub fn hex_escape_severity(bytes: &[u8]) -> Severity {
    let text = String::from_utf8_lossy(bytes);
    let count = text.matches("\\x").count() + text.matches("0x").count();
    if count > HEX_ESCAPE_HIGH {
        Severity::High
    } else if count > HEX_ESCAPE_MEDIUM {
        Severity::Medium
    } else {
        Severity::None
    }
}

pub fn unicode_escape_severity(bytes: &[u8]) -> Severity {
    let text = String::from_utf8_lossy(bytes);
    let count = text.matches("\\u").count();
    if count > UNICODE_ESCAPE_HIGH {
        Severity::High
    } else {
        Severity::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_entropy_short_text_is_none() {
        assert_eq!(entropy_severity(b"hello"), Severity::None);
    }

    #[test]
    fn high_entropy_long_blob_is_medium() {
        let blob: Vec<u8> = (0u16..300).map(|i| (i % 256) as u8).collect();
        assert_eq!(entropy_severity(&blob), Severity::Medium);
    }

    #[test]
    fn bidi_override_alone_is_high() {
        let text = format!("hello{}world", '\u{202E}');
        assert_eq!(invisible_severity(text.as_bytes()), Severity::High);
    }

    #[test]
    fn clean_text_has_no_invisible_signal() {
        assert_eq!(invisible_severity(b"just plain text"), Severity::None);
    }

    #[test]
    fn repeated_run_triggers_medium() {
        let mut data = Vec::new();
        for _ in 0..15 {
            data.extend_from_slice(b"ABCDEFGHIJ");
        }
        assert_eq!(repetition_severity(&data), Severity::Medium);
    }

    #[test]
    fn hex_escape_density_scales_with_count() {
        let light = "\\x41".repeat(3);
        let heavy = "\\x41".repeat(12);
        assert_eq!(hex_escape_severity(light.as_bytes()), Severity::None);
        assert_eq!(hex_escape_severity(heavy.as_bytes()), Severity::High);
    }

    #[test]
    fn unicode_escape_density() {
        let heavy = "\\u0041".repeat(6);
        assert_eq!(unicode_escape_severity(heavy.as_bytes()), Severity::High);
    }
}
