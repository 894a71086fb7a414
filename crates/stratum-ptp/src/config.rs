//! # Timestamping Configuration
//!
//! The external configuration surface: two boolean toggles (transmit
//! timestamping, receive filtering) settable individually or through a
//! validated request, plus the hardware mode synchronization that keeps
//! the FPGA's timestamp-generation bit consistent with them.
//!
//! Mode changes are idempotent: the hardware is only touched when the
//! desired state differs from the config register, and the transmit
//! queue is stopped around the change so no frame observes a
//! half-configured unit.

use log::debug;

use stratum_core::{Error, NetStack, PtpPacket, Result, WorkScheduler};
use stratum_hal::regs::{registers, PpConfig};
use stratum_hal::{IrqControl, IrqSource, RegisterIo};

use crate::engine::TimestampEngine;

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Transmit timestamping modes accepted by the configuration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TxTimestampMode {
    /// No transmit timestamps
    Off = 0,
    /// Stamp outgoing frames that request it
    On = 1,
}

impl TxTimestampMode {
    /// Parse the wire value of the configuration call.
    pub fn from_raw(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(Error::UnsupportedTxMode(other)),
        }
    }
}

/// Receive filters accepted by the configuration call.
///
/// The hardware stamps all PTPv2 L4 event frames or nothing; the three
/// specific filters all resolve to the event filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RxFilter {
    /// No receive timestamps
    None = 0,
    /// All PTPv2 L4 event frames
    PtpV2L4Event = 1,
    /// PTPv2 L4 sync frames
    PtpV2L4Sync = 2,
    /// PTPv2 L4 delay-request frames
    PtpV2L4DelayReq = 3,
}

impl RxFilter {
    /// Parse the wire value of the configuration call.
    pub fn from_raw(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::None),
            1 => Ok(Self::PtpV2L4Event),
            2 => Ok(Self::PtpV2L4Sync),
            3 => Ok(Self::PtpV2L4DelayReq),
            other => Err(Error::UnsupportedRxFilter(other)),
        }
    }

    /// Whether this filter stamps anything at all.
    #[inline]
    pub const fn stamps(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A validated hardware timestamping request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwtstampRequest {
    /// Requested transmit mode
    pub tx_mode: TxTimestampMode,
    /// Requested receive filter
    pub rx_filter: RxFilter,
}

impl HwtstampRequest {
    /// Validate the raw fields of a configuration call.
    ///
    /// Rejects a nonzero reserved-flags field and any unknown mode or
    /// filter value without mutating anything.
    pub fn from_raw(flags: u32, tx_mode: u32, rx_filter: u32) -> Result<Self> {
        if flags != 0 {
            return Err(Error::ReservedConfigFlags(flags));
        }
        Ok(Self {
            tx_mode: TxTimestampMode::from_raw(tx_mode)?,
            rx_filter: RxFilter::from_raw(rx_filter)?,
        })
    }
}

// =============================================================================
// CONFIGURATION CONTROLLER
// =============================================================================

impl<'d, D, P, const N: usize> TimestampEngine<'d, D, P, N>
where
    D: RegisterIo + IrqControl + WorkScheduler + NetStack<P>,
    P: PtpPacket,
{
    /// Enable or disable transmit timestamping, synchronizing the
    /// hardware mode.
    pub fn set_tx_enabled(&self, enable: bool) {
        debug!("tx timestamping {}", if enable { "on" } else { "off" });
        self.set_tx_flag(enable);
        self.sync_hw_mode();
    }

    /// Enable or disable receive timestamping, synchronizing the
    /// hardware mode.
    pub fn set_rx_enabled(&self, enable: bool) {
        debug!("rx timestamping {}", if enable { "on" } else { "off" });
        self.set_rx_flag(enable);
        self.sync_hw_mode();
    }

    /// Apply a validated timestamping request.
    ///
    /// Returns the configuration actually in effect: any stamping rx
    /// filter is widened to [`RxFilter::PtpV2L4Event`], which is what
    /// the hardware implements.
    pub fn configure(&self, request: HwtstampRequest) -> HwtstampRequest {
        self.set_tx_enabled(matches!(request.tx_mode, TxTimestampMode::On));
        self.set_rx_enabled(request.rx_filter.stamps());

        HwtstampRequest {
            tx_mode: request.tx_mode,
            rx_filter: if request.rx_filter.stamps() {
                RxFilter::PtpV2L4Event
            } else {
                RxFilter::None
            },
        }
    }

    /// Bring the hardware timestamp-generation bit in line with the
    /// desired mode. No-op when they already agree.
    fn sync_hw_mode(&self) {
        let config = PpConfig::from_bits_truncate(self.device().read_register(registers::PP_CONFIG));
        let have = config.contains(PpConfig::ENABLE_PTP_TIMESTAMPS);
        let want = self.tx_enabled() || self.rx_enabled();

        if have == want {
            return;
        }

        self.device().stop_tx_queue();

        self.device().write_register_masked(
            registers::PP_CONFIG,
            PpConfig::ENABLE_PTP_TIMESTAMPS.bits(),
            if want {
                PpConfig::ENABLE_PTP_TIMESTAMPS.bits()
            } else {
                0
            },
        );

        if want {
            self.device().enable_source(IrqSource::TxTimestampAvailable);
        } else {
            self.device().disable_source(IrqSource::TxTimestampAvailable);
        }

        self.device().start_tx_queue();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{TestDevice, TestPacket};

    fn engine(dev: &TestDevice) -> TimestampEngine<'_, TestDevice, TestPacket, 8> {
        TimestampEngine::new(dev)
    }

    #[test]
    fn test_request_validation() {
        assert_eq!(
            HwtstampRequest::from_raw(0x80, 1, 0),
            Err(Error::ReservedConfigFlags(0x80))
        );
        assert_eq!(
            HwtstampRequest::from_raw(0, 7, 0),
            Err(Error::UnsupportedTxMode(7))
        );
        assert_eq!(
            HwtstampRequest::from_raw(0, 1, 42),
            Err(Error::UnsupportedRxFilter(42))
        );

        let request = HwtstampRequest::from_raw(0, 1, 2).expect("valid request");
        assert_eq!(request.tx_mode, TxTimestampMode::On);
        assert_eq!(request.rx_filter, RxFilter::PtpV2L4Sync);
    }

    #[test]
    fn test_enable_touches_hardware_once() {
        let dev = TestDevice::new();
        let engine = engine(&dev);

        engine.set_tx_enabled(true);
        assert_eq!(
            dev.fpga.config(),
            PpConfig::ENABLE_PTP_TIMESTAMPS.bits()
        );
        assert!(dev.fpga.irq_enabled(stratum_hal::IrqSource::TxTimestampAvailable));
        assert_eq!(dev.queue_stops(), 1);
        assert_eq!(dev.queue_starts(), 1);

        // Same request again: nothing to change, queue untouched.
        engine.set_tx_enabled(true);
        assert_eq!(dev.queue_stops(), 1);
        assert_eq!(dev.queue_starts(), 1);
        assert_eq!(dev.fpga.ts_irq_enable_count(), 1);
    }

    #[test]
    fn test_mode_is_or_of_tx_and_rx() {
        let dev = TestDevice::new();
        let engine = engine(&dev);

        engine.set_tx_enabled(true);
        engine.set_rx_enabled(true);
        // Already enabled through tx; rx flips nothing.
        assert_eq!(dev.queue_stops(), 1);

        // Dropping tx alone keeps the feature bit: rx still wants it.
        engine.set_tx_enabled(false);
        assert_eq!(
            dev.fpga.config(),
            PpConfig::ENABLE_PTP_TIMESTAMPS.bits()
        );

        // Dropping rx too turns it off and masks the interrupt.
        engine.set_rx_enabled(false);
        assert_eq!(dev.fpga.config(), 0);
        assert!(!dev.fpga.irq_enabled(stratum_hal::IrqSource::TxTimestampAvailable));
        assert_eq!(dev.queue_stops(), 2);
        assert_eq!(dev.queue_starts(), 2);
    }

    #[test]
    fn test_configure_normalizes_rx_filter() {
        let dev = TestDevice::new();
        let engine = engine(&dev);

        let request = HwtstampRequest::from_raw(0, 1, 3).expect("valid request");
        let effective = engine.configure(request);

        assert_eq!(effective.tx_mode, TxTimestampMode::On);
        assert_eq!(effective.rx_filter, RxFilter::PtpV2L4Event);
        assert!(engine.tx_enabled());
        assert!(engine.rx_enabled());

        let off = HwtstampRequest::from_raw(0, 0, 0).expect("valid request");
        let effective = engine.configure(off);
        assert_eq!(effective.rx_filter, RxFilter::None);
        assert!(!engine.tx_enabled());
        assert!(!engine.rx_enabled());
        assert_eq!(dev.fpga.config(), 0);
    }
}
