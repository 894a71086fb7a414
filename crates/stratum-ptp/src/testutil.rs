//! Test doubles shared by the engine and configuration tests: a packet
//! handle carrying a synthetic PTPv2 event frame, and a device that
//! fronts the mock FPGA while recording completions, queue control, and
//! work scheduling.

use core::sync::atomic::{AtomicU32, Ordering};
use std::vec::Vec;

use spin::Mutex;

use stratum_core::{HwTimestamp, NetStack, PtpPacket, WorkScheduler};
use stratum_hal::mock::MockFpga;
use stratum_hal::{IrqControl, IrqSource, RegisterIo};

/// Build a minimal PTPv2-over-UDP-over-IPv4 event frame carrying `seq`.
pub fn ptp_event_frame(seq: u16) -> Vec<u8> {
    // Ethernet (14) + IPv4 without options (20) + UDP (8) + PTP (34)
    let mut frame = std::vec![0u8; 76];
    frame[12] = 0x08; // ethertype IPv4
    frame[14] = 0x45; // version 4, IHL 5
    frame[23] = 17; // protocol UDP
    frame[36] = 0x01; // udp dst port 319 (event)
    frame[37] = 0x3f;
    let seq_off = 14 + 20 + 8 + 30;
    frame[seq_off..seq_off + 2].copy_from_slice(&seq.to_be_bytes());
    frame
}

// =============================================================================
// TEST PACKET
// =============================================================================

/// Packet double: a label for completion bookkeeping plus a raw frame.
#[derive(Debug)]
pub struct TestPacket {
    pub label: u16,
    pub wants_ts: bool,
    pub in_flight: bool,
    pub rx_timestamp: Option<HwTimestamp>,
    frame: Vec<u8>,
}

impl TestPacket {
    /// A PTP event frame with a timestamp request.
    pub fn event(seq: u16) -> Self {
        Self {
            label: seq,
            wants_ts: true,
            in_flight: false,
            rx_timestamp: None,
            frame: ptp_event_frame(seq),
        }
    }

    /// A frame with no timestamp request.
    pub fn plain(seq: u16) -> Self {
        Self {
            wants_ts: false,
            ..Self::event(seq)
        }
    }

    /// A timestamp-requesting frame too short to carry a sequence id.
    pub fn truncated(label: u16) -> Self {
        Self {
            label,
            wants_ts: true,
            in_flight: false,
            rx_timestamp: None,
            frame: std::vec![0u8; 20],
        }
    }
}

impl PtpPacket for TestPacket {
    fn wants_tx_timestamp(&self) -> bool {
        self.wants_ts
    }

    fn frame(&self) -> &[u8] {
        &self.frame
    }

    fn mark_in_flight(&mut self) {
        self.in_flight = true;
    }

    fn set_rx_timestamp(&mut self, ts: HwTimestamp) {
        self.rx_timestamp = Some(ts);
    }
}

// =============================================================================
// TEST DEVICE
// =============================================================================

/// Device double fronting a [`MockFpga`].
#[derive(Debug, Default)]
pub struct TestDevice {
    pub fpga: MockFpga,
    completions: Mutex<Vec<(u16, Option<HwTimestamp>)>>,
    scheduled: AtomicU32,
    cancelled: AtomicU32,
    queue_stops: AtomicU32,
    queue_starts: AtomicU32,
}

impl TestDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions recorded so far, oldest first, clearing the log.
    pub fn take_completions(&self) -> Vec<(u16, Option<HwTimestamp>)> {
        core::mem::take(&mut *self.completions.lock())
    }

    pub fn scheduled(&self) -> u32 {
        self.scheduled.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> u32 {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn queue_stops(&self) -> u32 {
        self.queue_stops.load(Ordering::SeqCst)
    }

    pub fn queue_starts(&self) -> u32 {
        self.queue_starts.load(Ordering::SeqCst)
    }
}

impl RegisterIo for TestDevice {
    fn read_register(&self, reg: u32) -> u32 {
        self.fpga.read_register(reg)
    }

    fn read_repeated(&self, reg: u32, words: &mut [u32]) {
        self.fpga.read_repeated(reg, words)
    }

    fn write_register_masked(&self, reg: u32, mask: u32, value: u32) {
        self.fpga.write_register_masked(reg, mask, value)
    }
}

impl IrqControl for TestDevice {
    fn enable_source(&self, source: IrqSource) {
        self.fpga.enable_source(source)
    }

    fn disable_source(&self, source: IrqSource) {
        self.fpga.disable_source(source)
    }
}

impl WorkScheduler for TestDevice {
    fn schedule(&self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_and_wait(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

impl NetStack<TestPacket> for TestDevice {
    fn complete_tx(&self, packet: TestPacket, timestamp: Option<HwTimestamp>) {
        self.completions.lock().push((packet.label, timestamp));
    }

    fn stop_tx_queue(&self) {
        self.queue_stops.fetch_add(1, Ordering::SeqCst);
    }

    fn start_tx_queue(&self) {
        self.queue_starts.fetch_add(1, Ordering::SeqCst);
    }
}
