//! # Mock FPGA
//!
//! Software model of the packet processor's timestamp unit for host-side
//! testing, in the spirit of a dummy clock source: it implements the same
//! traits the real hardware shim implements, plus injection and
//! inspection hooks.
//!
//! The model covers exactly what the engine observes:
//! - the timestamp FIFO as a word stream (drained one word per read)
//! - the PP_IRQS "timestamp available" bit, tracking FIFO occupancy
//! - the PP_CONFIG register as plain storage
//! - per-source interrupt gating with enable/disable counters

use arrayvec::ArrayVec;
use spin::Mutex;

use stratum_core::SequenceId;

use crate::io::RegisterIo;
use crate::irq::{IrqControl, IrqSource};
use crate::regs::{registers, PpIrqs, RECORD_WORDS, START_OF_TIMESTAMP};

/// FIFO capacity of the model, in words.
const FIFO_WORDS: usize = 256;

// =============================================================================
// MOCK STATE
// =============================================================================

#[derive(Debug, Default)]
struct MockState {
    /// PP_CONFIG contents
    config: u32,
    /// Timestamp FIFO word stream, front is the next word read
    fifo: ArrayVec<u32, FIFO_WORDS>,
    /// Per-source interrupt enable mask
    irq_enabled: u32,
    /// Times the timestamp source was masked
    ts_irq_disables: u32,
    /// Times the timestamp source was unmasked
    ts_irq_enables: u32,
}

// =============================================================================
// MOCK FPGA
// =============================================================================

/// Software model of the FPGA timestamp unit.
///
/// Panics if more than [`FIFO_WORDS`] words are queued; the model is test
/// tooling, not production code.
#[derive(Debug, Default)]
pub struct MockFpga {
    state: Mutex<MockState>,
}

impl MockFpga {
    /// Create an empty model with all interrupt sources masked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one well-formed timestamp record at the tail of the FIFO.
    pub fn queue_record(&self, seq: SequenceId, secs: u64, nanos: u32) {
        let mut state = self.state.lock();
        state
            .fifo
            .push(((START_OF_TIMESTAMP as u32) << 16) | ((secs >> 32) as u32 & 0xffff));
        state.fifo.push(secs as u32);
        state.fifo.push(nanos);
        state.fifo.push(seq.raw() as u32);
    }

    /// Queue raw words ahead of any record, e.g. the tail of a previous
    /// partial read, to exercise the engine's realignment scan.
    pub fn inject_words(&self, words: &[u32]) {
        let mut state = self.state.lock();
        for &w in words {
            state.fifo.push(w);
        }
    }

    /// Words currently queued in the FIFO.
    pub fn fifo_words(&self) -> usize {
        self.state.lock().fifo.len()
    }

    /// Current PP_CONFIG contents.
    pub fn config(&self) -> u32 {
        self.state.lock().config
    }

    /// Whether an interrupt source is currently unmasked.
    pub fn irq_enabled(&self, source: IrqSource) -> bool {
        self.state.lock().irq_enabled & source.mask() != 0
    }

    /// Times the timestamp-available source was masked.
    pub fn ts_irq_disable_count(&self) -> u32 {
        self.state.lock().ts_irq_disables
    }

    /// Times the timestamp-available source was unmasked.
    pub fn ts_irq_enable_count(&self) -> u32 {
        self.state.lock().ts_irq_enables
    }

    fn pop_word(state: &mut MockState) -> u32 {
        if state.fifo.is_empty() {
            // An empty hardware FIFO reads as zero; the high half never
            // matches the start-of-timestamp marker.
            0
        } else {
            state.fifo.remove(0)
        }
    }
}

impl RegisterIo for MockFpga {
    fn read_register(&self, reg: u32) -> u32 {
        let mut state = self.state.lock();
        match reg {
            registers::PP_CONFIG => state.config,
            registers::PP_IRQS => {
                if state.fifo.is_empty() {
                    0
                } else {
                    PpIrqs::PTP_TX_TS_AVAILABLE.bits()
                }
            }
            registers::PTP_TX_TS_CNT => (state.fifo.len() / RECORD_WORDS) as u32,
            registers::TX_TIMESTAMP_FIFO => Self::pop_word(&mut state),
            _ => 0,
        }
    }

    fn read_repeated(&self, reg: u32, words: &mut [u32]) {
        let mut state = self.state.lock();
        for w in words.iter_mut() {
            *w = match reg {
                registers::TX_TIMESTAMP_FIFO => Self::pop_word(&mut state),
                _ => 0,
            };
        }
    }

    fn write_register_masked(&self, reg: u32, mask: u32, value: u32) {
        let mut state = self.state.lock();
        if reg == registers::PP_CONFIG {
            state.config = (state.config & !mask) | (value & mask);
        }
    }
}

impl IrqControl for MockFpga {
    fn enable_source(&self, source: IrqSource) {
        let mut state = self.state.lock();
        state.irq_enabled |= source.mask();
        if source == IrqSource::TxTimestampAvailable {
            state.ts_irq_enables += 1;
        }
    }

    fn disable_source(&self, source: IrqSource) {
        let mut state = self.state.lock();
        state.irq_enabled &= !source.mask();
        if source == IrqSource::TxTimestampAvailable {
            state.ts_irq_disables += 1;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_drains_word_by_word() {
        let fpga = MockFpga::new();
        fpga.queue_record(SequenceId::new(7), 3, 500);

        assert_eq!(
            fpga.read_register(registers::PP_IRQS),
            PpIrqs::PTP_TX_TS_AVAILABLE.bits()
        );
        assert_eq!(fpga.read_register(registers::PTP_TX_TS_CNT), 1);

        let sot = fpga.read_register(registers::TX_TIMESTAMP_FIFO);
        assert_eq!(sot >> 16, START_OF_TIMESTAMP as u32);

        let mut rest = [0u32; RECORD_WORDS - 1];
        fpga.read_repeated(registers::TX_TIMESTAMP_FIFO, &mut rest);
        assert_eq!(rest, [3, 500, 7]);

        assert_eq!(fpga.read_register(registers::PP_IRQS), 0);
        assert_eq!(fpga.read_register(registers::TX_TIMESTAMP_FIFO), 0);
    }

    #[test]
    fn test_masked_config_write() {
        let fpga = MockFpga::new();
        fpga.write_register_masked(registers::PP_CONFIG, 0x30, 0xff);
        assert_eq!(fpga.config(), 0x30);
        fpga.write_register_masked(registers::PP_CONFIG, 0x10, 0x00);
        assert_eq!(fpga.config(), 0x20);
    }

    #[test]
    fn test_irq_gating_counts() {
        let fpga = MockFpga::new();
        assert!(!fpga.irq_enabled(IrqSource::TxTimestampAvailable));

        fpga.enable_source(IrqSource::TxTimestampAvailable);
        assert!(fpga.irq_enabled(IrqSource::TxTimestampAvailable));
        fpga.disable_source(IrqSource::TxTimestampAvailable);
        assert!(!fpga.irq_enabled(IrqSource::TxTimestampAvailable));

        assert_eq!(fpga.ts_irq_enable_count(), 1);
        assert_eq!(fpga.ts_irq_disable_count(), 1);
    }
}
