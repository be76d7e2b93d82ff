use shield_pattern::{Severity, ThreatType};

use crate::error::ScannerError;

/// Outcome of a single innate scan pass.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub detected: bool,
    pub severity: Severity,
    pub threat_type: Option<ThreatType>,
    pub pattern_id: Option<u64>,
    pub offset: usize,
    pub length: usize,
    pub confidence: f64,
    pub scan_time_ns: u64,
    pub error: Option<ScannerError>,
}

impl ScanResult {
    pub fn clean(scan_time_ns: u64) -> Self {
        Self {
            detected: false,
            severity: Severity::None,
            threat_type: None,
            pattern_id: None,
            offset: 0,
            length: 0,
            confidence: 0.0,
            scan_time_ns,
            error: None,
        }
    }

    /// Empty input never matches anything; it's flagged `InvalidInput`
    /// rather than silently reported as a clean scan.
    pub fn invalid_input(scan_time_ns: u64) -> Self {
        Self { error: Some(ScannerError::InvalidInput), ..Self::clean(scan_time_ns) }
    }
}
