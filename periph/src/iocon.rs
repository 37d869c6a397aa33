//! Pin-function multiplexer (IOCON).
//!
//! One 32-bit register per pin; bits 2:0 route the pin to a peripheral
//! function. The function field is always cleared before the new code is
//! written, so stale mux bits never survive a re-route.

use crate::mmio::RegBlock;
use crate::{DriverError, Result};

/// Ports covered by the mux block (wider than the GPIO interrupt fabric).
pub const IOCON_PORT_COUNT: u8 = 6;

const PINS_PER_PORT: u8 = 32;
const FUNC_MASK: u32 = 0b111;

/// Window length covering all ports.
pub const IOCON_LEN: usize =
    IOCON_PORT_COUNT as usize * PINS_PER_PORT as usize * core::mem::size_of::<u32>();

/// Pin-function mux driver.
pub struct Iocon {
    regs: RegBlock,
}

impl Iocon {
    /// # Safety
    ///
    /// `base` must be the IOCON block.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegBlock::new(base, IOCON_LEN),
        }
    }

    /// Route `port.pin` to `function` (3-bit code). Clears the previous
    /// function bits first; all other pin configuration bits are preserved.
    pub fn set_function(&self, port: u8, pin: u8, function: u8) -> Result<()> {
        if port >= IOCON_PORT_COUNT {
            return Err(DriverError::InvalidPort { port });
        }
        if pin >= PINS_PER_PORT {
            return Err(DriverError::InvalidPin { pin });
        }
        if u32::from(function) > FUNC_MASK {
            return Err(DriverError::InvalidPinFunction { function });
        }
        let offset = (port as usize * PINS_PER_PORT as usize + pin as usize) * 4;
        unsafe {
            let value = (self.regs.read_u32(offset) & !FUNC_MASK) | u32::from(function);
            self.regs.write_u32(offset, value);
        }
        Ok(())
    }
}
