//! # PTP Frame Inspection
//!
//! Extraction of the PTP sequence id from raw transmit frames.
//!
//! Assumptions, inherited from the hardware's filter configuration:
//! - PTP event frames are PTPv2 over UDP over IPv4
//! - the sequence id is unique within the reconciliation window and
//!   sufficient to associate a timestamp record with its frame

use stratum_core::{Error, Result, SequenceId};

/// Ethernet header length, untagged
const ETH_HLEN: usize = 14;

/// UDP header length
const UDP_HLEN: usize = 8;

/// Offset of the sequence id within the PTPv2 common header
const OFF_PTP_SEQUENCE_ID: usize = 30;

// =============================================================================
// SEQUENCE ID EXTRACTION
// =============================================================================

/// Read the PTPv2 sequence id out of a raw frame.
///
/// `frame` starts at the Ethernet header. The IPv4 header length is
/// taken from the IHL field, so option-bearing headers are handled.
/// Returns [`Error::TruncatedFrame`] when the frame is too short to
/// carry the field.
pub fn tx_sequence_id(frame: &[u8]) -> Result<SequenceId> {
    let version_ihl = *frame.get(ETH_HLEN).ok_or(Error::TruncatedFrame)?;
    let ip_hlen = ((version_ihl & 0x0f) as usize) * 4;

    let offset = ETH_HLEN + ip_hlen + UDP_HLEN + OFF_PTP_SEQUENCE_ID;
    let bytes = frame
        .get(offset..offset + 2)
        .ok_or(Error::TruncatedFrame)?;

    Ok(SequenceId::new(u16::from_be_bytes([bytes[0], bytes[1]])))
}

// =============================================================================
// TESTS
// =============================================================================
