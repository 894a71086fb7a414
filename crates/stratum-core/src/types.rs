//! # STRATUM Core Types
//!
//! Fundamental type definitions used across the timestamping stack.
//!
//! These types provide:
//! - Strong typing for PTP sequence ids (correlation keys, not counters)
//! - A nanosecond-resolution hardware timestamp value
//! - Time conversion constants

use core::fmt;

/// Nanoseconds per second
pub const NSEC_PER_SEC: i64 = 1_000_000_000;

// =============================================================================
// SEQUENCE ID
// =============================================================================

/// PTP sequence id carried in a packet's PTPv2 header.
///
/// Used purely as a correlation key between a transmitted packet and the
/// hardware timestamp record the FPGA produced for it.
///
/// Ordering (`<`/`>`) is the plain integer comparison on the 16-bit value.
/// It is NOT wraparound-safe: behavior near the 16-bit rollover boundary
/// is unspecified. Known limitation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct SequenceId(u16);

impl SequenceId {
    /// Create a new sequence id
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw u16 value
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceId(0x{:04x})", self.0)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl From<u16> for SequenceId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

// =============================================================================
// HARDWARE TIMESTAMP
// =============================================================================

/// Hardware capture time, nanoseconds, signed 64-bit.
///
/// Produced by combining the 48-bit seconds counter and the nanoseconds
/// field of an FPGA timestamp record. Signed to match the network stack's
/// timestamp representation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct HwTimestamp(i64);

impl HwTimestamp {
    /// Create from raw nanoseconds
    #[inline]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create from a seconds + nanoseconds capture pair
    #[inline]
    pub const fn from_secs_nanos(secs: u64, nanos: u32) -> Self {
        Self(secs as i64 * NSEC_PER_SEC + nanos as i64)
    }

    /// Get the raw nanosecond value
    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Get the whole-seconds component
    #[inline]
    pub const fn secs(self) -> i64 {
        self.0 / NSEC_PER_SEC
    }

    /// Get the sub-second nanoseconds component
    #[inline]
    pub const fn subsec_nanos(self) -> u32 {
        (self.0 % NSEC_PER_SEC) as u32
    }
}

impl fmt::Debug for HwTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HwTimestamp({}.{:09}s)", self.secs(), self.subsec_nanos())
    }
}

impl fmt::Display for HwTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs(), self.subsec_nanos())
    }
}

// =============================================================================
// TESTS
// =============================================================================
