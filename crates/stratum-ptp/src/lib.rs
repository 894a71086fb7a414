//! # STRATUM PTP
//!
//! Hardware timestamp reconciliation engine for FPGA Ethernet MACs.
//!
//! Outgoing packets that request a PTP hardware timestamp are queued in a
//! pending ring while the FPGA asynchronously emits timestamp records,
//! tagged with the packet's PTP sequence id, into a hardware FIFO. This
//! crate pairs each record with its packet and completes the packet to
//! the network stack - handling loss, reordering, and buffer exhaustion
//! without ever stalling transmission.
//!
//! ## Architecture
//!
//! ```text
//!  tx submit path          interrupt context         deferred context
//!  ──────────────          ─────────────────         ────────────────
//!  intercept_tx()          handle_timestamp_irq()    process_timestamps()
//!       │                        │                         │
//!       ▼                        ▼                         ▼
//!  ┌───────────────┐      ┌────────────────┐    sequence-id matching,
//!  │ pending ring  │      │ timestamp ring │ ─▶ completion delivery,
//!  └───────────────┘      └────────────────┘    IRQ re-enable
//!         └──────────── one shared lock ────────────┘
//! ```
//!
//! Both rings live behind a single interrupt-safe lock together with the
//! irq-disabled-pending flag; see [`engine::TimestampEngine`].

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod config;
pub mod engine;
pub mod frame;
pub mod record;
pub mod ring;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenience
pub use config::{HwtstampRequest, RxFilter, TxTimestampMode};
pub use engine::{EngineStats, TimestampEngine, DEFAULT_RING_SLOTS};
pub use record::FpgaTimestamp;
pub use ring::{OverflowPolicy, PushOutcome, SlotRing};
