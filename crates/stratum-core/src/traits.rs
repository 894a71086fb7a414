//! # STRATUM Core Traits
//!
//! Seams between the timestamping engine and its collaborators.
//!
//! The engine never owns a network stack, a work queue, or a packet
//! representation; the embedding driver provides all three behind these
//! traits. This keeps the reconciliation core host-testable and free of
//! any ambient global state.
//!
//! ## Collaborator Overview
//!
//! ```text
//! TimestampEngine
//!    │
//!    ├── PtpPacket      (packet handles flowing through the engine)
//!    ├── NetStack       (completion delivery + tx queue control)
//!    └── WorkScheduler  (deferred reconciliation runs)
//! ```

use crate::types::HwTimestamp;

// =============================================================================
// PACKET HANDLE TRAIT
// =============================================================================

/// Opaque handle to a packet flowing through the timestamping engine.
///
/// On the transmit side the engine takes ownership of handles whose
/// submitter requested a hardware timestamp, and hands each one back to
/// the [`NetStack`] exactly once - matched or not.
pub trait PtpPacket {
    /// Whether the submitter requested a hardware transmit timestamp.
    fn wants_tx_timestamp(&self) -> bool;

    /// Raw frame bytes, starting at the Ethernet header.
    fn frame(&self) -> &[u8];

    /// Record that completion is deferred until a timestamp is matched
    /// (or presumed lost). Called by the submission gate before the
    /// packet enters the pending ring.
    fn mark_in_flight(&mut self);

    /// Attach a receive-side hardware timestamp to this packet's
    /// metadata.
    fn set_rx_timestamp(&mut self, ts: HwTimestamp);
}

// =============================================================================
// NETWORK STACK TRAIT
// =============================================================================

/// Completion and flow-control surface of the embedding network stack.
pub trait NetStack<P: PtpPacket> {
    /// Hand a transmitted packet back to the stack.
    ///
    /// `timestamp` is `Some` when the packet was matched with a hardware
    /// timestamp record, `None` when its timestamp is presumed lost and
    /// the packet completes without one.
    ///
    /// May be invoked with the engine's ring lock held; implementations
    /// must not re-enter the engine.
    fn complete_tx(&self, packet: P, timestamp: Option<HwTimestamp>);

    /// Stop the transmit queue. Used to bound the window during a
    /// hardware timestamping mode change.
    fn stop_tx_queue(&self);

    /// Restart the transmit queue after a mode change.
    fn start_tx_queue(&self);
}

// =============================================================================
// DEFERRED WORK TRAIT
// =============================================================================

/// Scheduler for the deferred reconciliation worker.
///
/// At most one worker instance executes at a time; `schedule` requests
/// coalesce while a run is pending.
pub trait WorkScheduler {
    /// Request a deferred run of the reconciliation worker.
    ///
    /// Must be callable from interrupt context and must not block.
    fn schedule(&self);

    /// Cancel any pending run and wait for an executing one to finish.
    ///
    /// Must not be called from interrupt context.
    fn cancel_and_wait(&self);
}

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

// Correlation keys and timestamps cross context boundaries freely.
static_assertions::assert_impl_all!(crate::types::SequenceId: Send, Sync, Copy);
static_assertions::assert_impl_all!(crate::types::HwTimestamp: Send, Sync, Copy);
