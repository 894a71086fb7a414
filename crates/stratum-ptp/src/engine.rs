//! # Timestamp Reconciliation Engine
//!
//! Pairs FPGA transmit timestamp records with the packets that requested
//! them, by PTP sequence id, and completes each packet to the network
//! stack exactly once.
//!
//! Three contexts touch the engine:
//! - **interrupt**: [`TimestampEngine::handle_timestamp_irq`] pulls one
//!   record out of the hardware FIFO into the timestamp ring
//! - **deferred work**: [`TimestampEngine::process_timestamps`] drains
//!   both rings in lock-step
//! - **synchronous callers**: [`TimestampEngine::intercept_tx`] on the
//!   transmit path, the configuration surface in [`crate::config`], and
//!   [`TimestampEngine::flush`] on shutdown or mode change
//!
//! All shared state - both rings and the irq-disabled-pending flag -
//! sits behind one spin lock. Every operation under the lock is bounded:
//! the interrupt path does a fixed-size FIFO scan and O(1) ring work,
//! the worker loops at most ring-occupancy times.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, warn};
use spin::Mutex;

use stratum_core::{NetStack, PtpPacket, SequenceId, WorkScheduler};
use stratum_hal::regs::{registers, PpIrqs, RECORD_WORDS, START_OF_TIMESTAMP};
use stratum_hal::{IrqControl, IrqSource, RegisterIo};

use crate::frame;
use crate::record::FpgaTimestamp;
use crate::ring::{OverflowPolicy, PushOutcome, SlotRing};

/// Default slot count for both rings. Usable capacity is one less.
pub const DEFAULT_RING_SLOTS: usize = 16;

// =============================================================================
// ENGINE STATISTICS
// =============================================================================

/// Counters for the reconciliation outcomes and loss conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Packets completed with a matching hardware timestamp
    pub matched: u64,
    /// Packets completed without a timestamp (record presumed lost)
    pub lost_timestamps: u64,
    /// Records discarded with no still-pending packet
    pub orphaned_timestamps: u64,
    /// Pending packets displaced by newer submissions
    pub evicted_packets: u64,
    /// FIFO scans that never found a start-of-timestamp marker
    pub scan_failures: u64,
    /// Records recovered after skipping stale FIFO words
    pub misaligned_records: u64,
    /// Times the timestamp interrupt was masked on ring overflow
    pub overflow_irq_disables: u64,
}

// =============================================================================
// MATCH CLASSIFICATION
// =============================================================================

/// Outcome of comparing a record's sequence id against a packet's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchOutcome {
    /// Ids equal: deliver the timestamp, consume both.
    Matched,
    /// Record id greater: the packet's record was lost. Consume the
    /// packet, keep the record for the next packet.
    TimestampLost,
    /// Record id smaller: the record's packet is long gone. Consume the
    /// record, keep the packet.
    RecordOrphaned,
}

fn classify(record: SequenceId, packet: SequenceId) -> MatchOutcome {
    if record == packet {
        MatchOutcome::Matched
    } else if record > packet {
        MatchOutcome::TimestampLost
    } else {
        MatchOutcome::RecordOrphaned
    }
}

// =============================================================================
// ENGINE STATE
// =============================================================================

/// Everything behind the shared ring lock.
#[derive(Debug)]
struct EngineState<P, const N: usize> {
    /// Records read out of the hardware FIFO, oldest first
    timestamps: SlotRing<FpgaTimestamp, N>,
    /// Packets awaiting a record, oldest first
    pending: SlotRing<P, N>,
    /// The timestamp interrupt was masked on overflow and needs
    /// re-enabling once the worker frees ring space
    reenable_irq: bool,
    /// Outcome counters
    stats: EngineStats,
}

// =============================================================================
// TIMESTAMP ENGINE
// =============================================================================

/// The reconciliation engine.
///
/// `D` is the embedding driver's device handle, providing register
/// access, interrupt gating, deferred-work scheduling, and the network
/// stack surface. `P` is its packet handle type. `N` sizes both rings.
///
/// The internal lock is a spin lock that may be taken from interrupt
/// context. When the embedding driver runs the interrupt path for real,
/// every non-interrupt caller must hold the lock with the timestamp
/// interrupt masked on the local CPU (or an equivalent discipline); the
/// engine itself never sleeps or re-locks while holding it.
#[derive(Debug)]
pub struct TimestampEngine<'d, D, P, const N: usize = DEFAULT_RING_SLOTS>
where
    D: RegisterIo + IrqControl + WorkScheduler + NetStack<P>,
    P: PtpPacket,
{
    dev: &'d D,
    state: Mutex<EngineState<P, N>>,
    tx_enabled: AtomicBool,
    rx_enabled: AtomicBool,
}

impl<'d, D, P, const N: usize> TimestampEngine<'d, D, P, N>
where
    D: RegisterIo + IrqControl + WorkScheduler + NetStack<P>,
    P: PtpPacket,
{
    /// Create an engine with both rings empty and timestamping disabled.
    pub fn new(dev: &'d D) -> Self {
        Self {
            dev,
            state: Mutex::new(EngineState {
                timestamps: SlotRing::new(OverflowPolicy::Reject),
                pending: SlotRing::new(OverflowPolicy::EvictOldest),
                reenable_irq: false,
                stats: EngineStats::default(),
            }),
            tx_enabled: AtomicBool::new(false),
            rx_enabled: AtomicBool::new(false),
        }
    }

    /// Whether transmit timestamping is enabled.
    pub fn tx_enabled(&self) -> bool {
        self.tx_enabled.load(Ordering::Acquire)
    }

    /// Whether receive timestamping is enabled.
    pub fn rx_enabled(&self) -> bool {
        self.rx_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_tx_flag(&self, enable: bool) {
        self.tx_enabled.store(enable, Ordering::Release);
    }

    pub(crate) fn set_rx_flag(&self, enable: bool) {
        self.rx_enabled.store(enable, Ordering::Release);
    }

    pub(crate) fn device(&self) -> &'d D {
        self.dev
    }

    /// Snapshot of the outcome counters.
    pub fn stats(&self) -> EngineStats {
        self.state.lock().stats
    }

    /// Packets currently awaiting a timestamp.
    pub fn pending_packets(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Records currently awaiting a packet.
    pub fn queued_timestamps(&self) -> usize {
        self.state.lock().timestamps.len()
    }

    // =========================================================================
    // INTERRUPT PRODUCER
    // =========================================================================

    /// Pull one timestamp record out of the hardware FIFO.
    ///
    /// Called once per "timestamp available" interrupt, from interrupt
    /// context. Never blocks: on a full timestamp ring the source
    /// interrupt is masked instead of waiting for the worker, and the
    /// FIFO data is deliberately left unread.
    pub fn handle_timestamp_irq(&self) {
        let mut state = self.state.lock();

        if state.timestamps.is_full() {
            error!("tx timestamp buffer full, timestamp irq disabled");
            state.reenable_irq = true;
            state.stats.overflow_irq_disables += 1;
            self.dev.disable_source(IrqSource::TxTimestampAvailable);
            return;
        }

        debug!(
            "tx timestamp count: {:#010x}",
            self.dev.read_register(registers::PTP_TX_TS_CNT)
        );

        // A previous partial read may have left the FIFO mid-record;
        // scan word-by-word for the start marker to realign.
        let mut sot = 0u32;
        let mut found_at = None;
        for attempt in 0..RECORD_WORDS {
            sot = self.dev.read_register(registers::TX_TIMESTAMP_FIFO);
            if (sot >> 16) as u16 == START_OF_TIMESTAMP {
                found_at = Some(attempt);
                break;
            }
        }

        let skipped = match found_at {
            Some(skipped) => skipped,
            None => {
                error!("no start of timestamp found");
                state.stats.scan_failures += 1;
                drop(state);
                // Records may remain queued behind the garbage.
                self.dev.schedule();
                return;
            }
        };
        if skipped > 0 {
            debug!("misaligned timestamp for tx packet found");
            state.stats.misaligned_records += 1;
        }

        debug!("reading timestamp for tx packet");

        let mut rest = [0u32; FpgaTimestamp::TRAILING_WORDS];
        self.dev
            .read_repeated(registers::TX_TIMESTAMP_FIFO, &mut rest);

        let outcome = state.timestamps.push(FpgaTimestamp::from_fifo_words(sot, &rest));
        // Full was rejected on entry and the lock is held throughout.
        debug_assert!(matches!(outcome, PushOutcome::Stored));

        drop(state);

        // Schedule always in case of remaining timestamps in the FIFO.
        self.dev.schedule();
    }

    // =========================================================================
    // SUBMISSION GATE
    // =========================================================================

    /// Intercept a packet about to be transmitted.
    ///
    /// Called on the transmit path, under the driver's coarse device
    /// lock, before the frame is handed to hardware.
    ///
    /// Returns the packet when it is not consumed (timestamping off, or
    /// no timestamp requested) and the caller completes it through the
    /// normal path. Returns `None` when the engine took ownership: the
    /// packet is marked in-flight and completes later through the
    /// reconciliation worker.
    pub fn intercept_tx(&self, mut packet: P) -> Option<P> {
        if !self.tx_enabled() {
            return Some(packet);
        }
        if !packet.wants_tx_timestamp() {
            return Some(packet);
        }

        debug!("requesting timestamp for tx packet");
        packet.mark_in_flight();

        let displaced = {
            let mut state = self.state.lock();
            match state.pending.push(packet) {
                PushOutcome::Stored => None,
                PushOutcome::Evicted(old) | PushOutcome::Rejected(old) => {
                    state.stats.evicted_packets += 1;
                    Some(old)
                }
            }
        };

        if let Some(old) = displaced {
            warn!("packet ringbuffer for timestamping full, discarding oldest entry");
            self.dev.complete_tx(old, None);
        }

        None
    }

    // =========================================================================
    // RECONCILIATION WORKER
    // =========================================================================

    /// Drain both rings in lock-step, completing packets as records are
    /// matched or presumed lost.
    ///
    /// Runs in deferred context; at most one instance executes at a
    /// time. Completion callbacks are invoked with the ring lock held.
    /// The loop is packet-driven: records left queued when the pending
    /// ring empties first stay for the next invocation.
    pub fn process_timestamps(&self) {
        let reenable = {
            let mut state = self.state.lock();

            loop {
                let record = match state.timestamps.peek() {
                    Some(record) => *record,
                    None => break,
                };
                let packet_seq = match state.pending.peek() {
                    Some(packet) => frame::tx_sequence_id(packet.frame()),
                    None => break,
                };

                let packet_seq = match packet_seq {
                    Ok(seq) => seq,
                    Err(_) => {
                        // No usable sequence id: the packet can never be
                        // matched. Complete it bare, keep the record.
                        debug!("packet does not contain ptp sequence id (length invalid)");
                        if let Some(packet) = state.pending.pop() {
                            state.stats.lost_timestamps += 1;
                            self.dev.complete_tx(packet, None);
                        }
                        continue;
                    }
                };

                match classify(record.sequence_id, packet_seq) {
                    MatchOutcome::Matched => {
                        debug!(
                            "found valid timestamp for tx packet; sequence id {}",
                            packet_seq
                        );
                        let _ = state.timestamps.pop();
                        if let Some(packet) = state.pending.pop() {
                            state.stats.matched += 1;
                            self.dev.complete_tx(packet, Some(record.timestamp()));
                        }
                    }
                    MatchOutcome::TimestampLost => {
                        debug!(
                            "timestamp sequence id ({}) > packet sequence id ({}) => discard packet",
                            record.sequence_id, packet_seq
                        );
                        if let Some(packet) = state.pending.pop() {
                            state.stats.lost_timestamps += 1;
                            self.dev.complete_tx(packet, None);
                        }
                    }
                    MatchOutcome::RecordOrphaned => {
                        debug!(
                            "timestamp sequence id ({}) < packet sequence id ({}) => discard timestamp",
                            record.sequence_id, packet_seq
                        );
                        let _ = state.timestamps.pop();
                        state.stats.orphaned_timestamps += 1;
                    }
                }
            }

            // Re-enable only once space has actually been freed; a still
            // full ring keeps the flag set for the next invocation.
            if state.reenable_irq && !state.timestamps.is_full() {
                state.reenable_irq = false;
                true
            } else {
                false
            }
        };

        if reenable {
            self.dev.enable_source(IrqSource::TxTimestampAvailable);
        }
    }

    // =========================================================================
    // RECEIVE STAMPING
    // =========================================================================

    /// Attach a receive-side hardware timestamp to a packet.
    ///
    /// The record arrives with the receive descriptor rather than
    /// through the FIFO; it is validated by its start marker.
    pub fn stamp_rx(&self, packet: &mut P, record: &FpgaTimestamp) {
        if !self.rx_enabled() {
            return;
        }
        if !record.has_start_marker() {
            debug!("rx timestamp has no start-of-timestamp marker");
            return;
        }

        debug!("valid rx timestamp found");
        packet.set_rx_timestamp(record.timestamp());
    }

    // =========================================================================
    // FLUSH / DRAIN
    // =========================================================================

    /// Tear down all reconciliation state.
    ///
    /// Cancels and waits out any deferred work, drains the hardware FIFO,
    /// releases every still-pending packet as timestamp-lost, and resets
    /// both rings. Safe to call with nothing pending. Must not be called
    /// from interrupt context.
    pub fn flush(&self) {
        self.dev.cancel_and_wait();

        let mut state = self.state.lock();

        // Drain residual records until the hardware stops signalling.
        loop {
            let irqs = PpIrqs::from_bits_truncate(self.dev.read_register(registers::PP_IRQS));
            if !irqs.contains(PpIrqs::PTP_TX_TS_AVAILABLE) {
                break;
            }
            let mut discard = [0u32; RECORD_WORDS];
            self.dev
                .read_repeated(registers::TX_TIMESTAMP_FIFO, &mut discard);
        }

        while let Some(packet) = state.pending.pop() {
            self.dev.complete_tx(packet, None);
        }

        state.timestamps.reset();
        state.pending.reset();
        state.reenable_irq = false;
    }
}

// =============================================================================
// TESTS
// =============================================================================
