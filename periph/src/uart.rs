//! UART channel driver: baud programming, pin routing and polled byte I/O.
//!
//! The register model is the 16550-style block the part instantiates per
//! channel. Interrupt-driven receive lives in [`crate::uart_rx`]; this module
//! covers everything a purely polled user needs.

use alloc::sync::Arc;

use bitflags::bitflags;
use rtos_shim::irq::IrqLine;

use crate::iocon::Iocon;
use crate::mmio::RegBlock;
use crate::syscon::{Peripheral, Syscon};
use crate::uart_rx::RxShared;
use crate::{spin_while, DriverError, Result, SpinLimit};

// Register offsets. RBR, THR and DLL share +0x00 and IER shares +0x04 with
// DLM; LCR bit 7 (DLAB) selects the divisor latches.
pub(crate) const RBR: usize = 0x00; // Read: receiver buffer
pub(crate) const THR: usize = 0x00; // Write: transmit holding
const DLL: usize = 0x00; // DLAB set: divisor low byte
pub(crate) const IER: usize = 0x04; // Interrupt enable
const DLM: usize = 0x04; // DLAB set: divisor high byte
pub(crate) const IIR: usize = 0x08; // Read: interrupt identification
const LCR: usize = 0x0C; // Line control
pub(crate) const LSR: usize = 0x14; // Line status

/// Window length of one UART register block.
pub const UART_LEN: usize = 0x18;

const LCR_WORD_8BIT: u32 = 0b11;
const LCR_DLAB: u32 = 1 << 7;

// IIR bit 0 is active low: a set bit means nothing is pending.
pub(crate) const IIR_NO_INTERRUPT_PENDING: u32 = 1 << 0;

bitflags! {
    /// Line status register bits this driver reads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct LineStatus: u32 {
        const RX_DATA_READY = 1 << 0;
        const THR_EMPTY = 1 << 5;
    }
}

bitflags! {
    /// Interrupt enable register bits this driver writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct InterruptEnable: u32 {
        const RX_DATA_AVAILABLE = 1 << 0;
    }
}

/// UART instances this layer routes. Channels 0 and 1 are reserved for the
/// boot console and stay with the board layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartId {
    Uart2,
    Uart3,
}

impl UartId {
    /// Channel number as printed on the part's pinout.
    pub const fn index(self) -> u8 {
        match self {
            Self::Uart2 => 2,
            Self::Uart3 => 3,
        }
    }

    /// Power-enable identity for [`Syscon::power_on`].
    pub const fn peripheral(self) -> Peripheral {
        match self {
            Self::Uart2 => Peripheral::Uart2,
            Self::Uart3 => Peripheral::Uart3,
        }
    }

    /// Processor interrupt line the channel asserts.
    pub const fn irq_line(self) -> IrqLine {
        match self {
            Self::Uart2 => IrqLine(7),
            Self::Uart3 => IrqLine(8),
        }
    }
}

/// One UART channel over its register block.
pub struct Uart {
    pub(crate) id: UartId,
    pub(crate) regs: RegBlock,
    pub(crate) rx: Option<Arc<RxShared>>,
}

impl Uart {
    /// # Safety
    ///
    /// `base` must be the register block of the channel named by `id`.
    pub const unsafe fn new(id: UartId, base: usize) -> Self {
        Self {
            id,
            regs: RegBlock::new(base, UART_LEN),
            rx: None,
        }
    }

    pub const fn id(&self) -> UartId {
        self.id
    }

    /// Power the channel and program `baud_rate` against `source_clock_hz`.
    ///
    /// Frame format is fixed at 8 data bits, 1 stop bit, no parity. The
    /// divisor latches are left closed (DLAB cleared) on return.
    pub fn init(&self, syscon: &Syscon, source_clock_hz: u32, baud_rate: u32) -> Result<()> {
        let divisor = baud_divisor(source_clock_hz, baud_rate)?;
        syscon.power_on(self.id.peripheral());
        unsafe {
            self.regs.write_u32(LCR, LCR_DLAB | LCR_WORD_8BIT);
            self.regs.write_u32(DLL, divisor & 0xFF);
            self.regs.write_u32(DLM, (divisor >> 8) & 0xFF);
            self.regs.write_u32(LCR, LCR_WORD_8BIT);
        }
        log::debug!(
            "uart{}: {} baud from {} Hz (divisor {})",
            self.id.index(),
            baud_rate,
            source_clock_hz,
            divisor
        );
        Ok(())
    }

    /// Route the channel's TXD/RXD pins to the UART function.
    pub fn configure_pins(&self, iocon: &Iocon) -> Result<()> {
        let (port, tx_pin, rx_pin, function) = match self.id {
            UartId::Uart2 => (0, 10, 11, 0b001),
            UartId::Uart3 => (4, 28, 29, 0b010),
        };
        iocon.set_function(port, tx_pin, function)?;
        iocon.set_function(port, rx_pin, function)?;
        log::debug!(
            "uart{}: routed P{}.{}/P{}.{}",
            self.id.index(),
            port,
            tx_pin,
            port,
            rx_pin
        );
        Ok(())
    }

    /// Spin until the transmit holding register drains, then write `byte`.
    ///
    /// Task context only. [`SpinLimit::Forever`] is an unbounded busy-wait.
    pub fn polled_write(&self, byte: u8, limit: SpinLimit) -> Result<()> {
        spin_while(limit, || {
            !self.line_status().contains(LineStatus::THR_EMPTY)
        })?;
        unsafe { self.regs.write_u32(THR, u32::from(byte)) };
        Ok(())
    }

    /// Spin until a byte is ready, then read it. Same caveats as
    /// [`Uart::polled_write`]. Do not mix with the interrupt pipeline on the
    /// same channel: both consume the one data-ready condition.
    pub fn polled_read(&self, limit: SpinLimit) -> Result<u8> {
        spin_while(limit, || {
            !self.line_status().contains(LineStatus::RX_DATA_READY)
        })?;
        let byte = unsafe { self.regs.read_u32(RBR) };
        Ok(byte as u8)
    }

    pub(crate) fn line_status(&self) -> LineStatus {
        LineStatus::from_bits_retain(unsafe { self.regs.read_u32(LSR) })
    }
}

/// 16x-oversampled integer divisor, rounded to nearest.
fn baud_divisor(source_clock_hz: u32, baud_rate: u32) -> Result<u32> {
    if baud_rate == 0 {
        return Err(DriverError::InvalidBaudRate { baud_rate });
    }
    let denominator = 16 * u64::from(baud_rate);
    if u64::from(source_clock_hz) < denominator {
        return Err(DriverError::UnachievableBaudRate {
            source_clock_hz,
            baud_rate,
        });
    }
    let divisor = (u64::from(source_clock_hz) + denominator / 2) / denominator;
    if divisor > 0xFFFF {
        return Err(DriverError::UnachievableBaudRate {
            source_clock_hz,
            baud_rate,
        });
    }
    Ok(divisor as u32)
}
