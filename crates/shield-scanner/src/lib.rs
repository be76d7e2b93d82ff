//! Innate (static pattern) and cognitive (behavioral marker) scanning.

mod cognitive;
mod error;
mod heuristics;
mod innate;
mod result;

pub use cognitive::{CognitiveScanner, CognitiveVerdict, MarkerDetection, MarkerFamily};
pub use error::{Result, ScannerError};
pub use innate::{InnateScanner, MAX_SCAN_BYTES};
pub use result::ScanResult;
