//! # STRATUM Error Handling
//!
//! Unified error type for the timestamping engine.
//!
//! The only hard failure ever surfaced to a caller is a rejected
//! configuration request. Everything else (FIFO scan failures, ring
//! overflow, sequence mismatches) is a recoverable condition the engine
//! absorbs: logged and counted, never propagated as a panic.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// STRATUM Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// STRATUM unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Reserved flags field of a timestamping request was nonzero
    ReservedConfigFlags(u32),
    /// Requested transmit timestamping mode is not supported
    UnsupportedTxMode(u32),
    /// Requested receive filter is not supported
    UnsupportedRxFilter(u32),

    // =========================================================================
    // Hardware Record Errors
    // =========================================================================
    /// No start-of-timestamp marker found within the bounded FIFO scan
    NoStartOfTimestamp,

    // =========================================================================
    // Frame Errors
    // =========================================================================
    /// Frame too short to carry a PTP sequence id
    TruncatedFrame,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedConfigFlags(flags) => {
                write!(f, "reserved config flags must be zero, got {:#010x}", flags)
            }
            Self::UnsupportedTxMode(mode) => {
                write!(f, "unsupported tx timestamping mode {}", mode)
            }
            Self::UnsupportedRxFilter(filter) => {
                write!(f, "unsupported rx timestamp filter {}", filter)
            }
            Self::NoStartOfTimestamp => write!(f, "no start-of-timestamp marker found"),
            Self::TruncatedFrame => write!(f, "frame does not contain a ptp sequence id"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_rejected_value() {
        let msg = std::format!("{}", Error::ReservedConfigFlags(0xdead_beef));
        assert!(msg.contains("0xdeadbeef"));

        let msg = std::format!("{}", Error::UnsupportedRxFilter(12));
        assert!(msg.contains("12"));
    }
}
