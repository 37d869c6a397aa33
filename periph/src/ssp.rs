//! SSP (SPI) controller: prescaler bring-up and polled full-duplex exchange.

use crate::iocon::Iocon;
use crate::mmio::RegBlock;
use crate::syscon::{Peripheral, Syscon};
use crate::{spin_while, DriverError, Result, SpinLimit};

const CR0: usize = 0x00; // Format: data size, frame format, clock phase
const CR1: usize = 0x04; // Control: controller enable
const DR: usize = 0x08; // Data, both directions
const SR: usize = 0x0C; // Status
const CPSR: usize = 0x10; // Even clock prescaler, 2..=254

/// Window length of the SSP register block.
pub const SSP_LEN: usize = 0x14;

const CR0_DATA_8BIT: u32 = 7;
const CR1_ENABLE: u32 = 1 << 1;
const SR_BUSY: u32 = 1 << 4;

/// The SSP2 instance over its register block.
pub struct Ssp {
    regs: RegBlock,
}

impl Ssp {
    /// # Safety
    ///
    /// `base` must be the SSP2 register block.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegBlock::new(base, SSP_LEN),
        }
    }

    /// Power the controller, program the fastest bus clock at or under
    /// `max_bus_clock_hz`, and enable 8-bit transfers.
    pub fn init(&self, syscon: &Syscon, source_clock_hz: u32, max_bus_clock_hz: u32) -> Result<()> {
        let prescale = bus_prescaler(source_clock_hz, max_bus_clock_hz)?;
        syscon.power_on(Peripheral::Ssp2);
        unsafe {
            self.regs.write_u32(CPSR, prescale);
            self.regs.write_u32(CR0, CR0_DATA_8BIT);
            self.regs.write_u32(CR1, CR1_ENABLE);
        }
        log::debug!(
            "ssp2: bus clock {} Hz (prescale {})",
            source_clock_hz / prescale,
            prescale
        );
        Ok(())
    }

    /// Route SCK/MOSI/MISO (P1.0, P1.1, P1.4) to the SSP function.
    pub fn configure_pins(&self, iocon: &Iocon) -> Result<()> {
        for pin in [0, 1, 4] {
            iocon.set_function(1, pin, 0b100)?;
        }
        Ok(())
    }

    /// Clock one byte out and the peer's byte in. Task context only.
    pub fn exchange(&self, byte: u8, limit: SpinLimit) -> Result<u8> {
        unsafe { self.regs.write_u32(DR, u32::from(byte)) };
        spin_while(limit, || unsafe { self.regs.read_u32(SR) } & SR_BUSY != 0)?;
        Ok(unsafe { self.regs.read_u32(DR) } as u8)
    }
}

/// Smallest even prescaler that keeps `source_clock_hz / prescale` at or
/// under `max_bus_clock_hz`. The register only takes even values 2..=254.
fn bus_prescaler(source_clock_hz: u32, max_bus_clock_hz: u32) -> Result<u32> {
    if max_bus_clock_hz == 0 {
        return Err(DriverError::UnachievableBusClock {
            source_clock_hz,
            max_bus_clock_hz,
        });
    }
    // Range-checked before rounding; the round-up cannot overflow.
    let quotient = source_clock_hz.div_ceil(max_bus_clock_hz);
    if quotient > 254 {
        return Err(DriverError::UnachievableBusClock {
            source_clock_hz,
            max_bus_clock_hz,
        });
    }
    Ok(quotient.max(2).next_multiple_of(2))
}
