//! GPIO banks: pin addressing and line control.
//!
//! Three contiguous 0x20-byte banks sit behind one base address; each bank
//! carries DIR (+0x00), MASK (+0x10), PIN (+0x14), SET (+0x18) and CLR
//! (+0x1C). Every operation touches exactly one pin's bit: direction changes
//! read-modify-write DIR, level changes go through the write-one SET/CLR
//! registers so sibling pins are never clobbered.

use static_assertions::const_assert;

use crate::mmio::RegBlock;
use crate::{DriverError, Result};

/// GPIO banks wired on this part.
pub const PORT_COUNT: u8 = 3;

/// Lines per bank.
pub const PINS_PER_PORT: u8 = 32;

const BANK_STRIDE: usize = 0x20;

// Register offsets within one bank.
const DIR: usize = 0x00; // Direction: 1 = output
const PIN: usize = 0x14; // Sampled line levels
const SET: usize = 0x18; // Write 1: drive high
const CLR: usize = 0x1C; // Write 1: drive low

/// Window length covering all banks.
pub const GPIO_LEN: usize = PORT_COUNT as usize * BANK_STRIDE;

const_assert!(CLR + 4 <= BANK_STRIDE);

/// One GPIO line, identified by bank and bit. Valid by construction, so the
/// line-control operations are total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPin {
    port: u8,
    pin: u8,
}

impl PortPin {
    pub const fn new(port: u8, pin: u8) -> Result<Self> {
        if port >= PORT_COUNT {
            return Err(DriverError::InvalidPort { port });
        }
        if pin >= PINS_PER_PORT {
            return Err(DriverError::InvalidPin { pin });
        }
        Ok(Self { port, pin })
    }

    pub const fn port(self) -> u8 {
        self.port
    }

    pub const fn pin(self) -> u8 {
        self.pin
    }

    pub(crate) const fn mask(self) -> u32 {
        1 << self.pin
    }

    const fn bank_offset(self) -> usize {
        self.port as usize * BANK_STRIDE
    }
}

/// GPIO line-control driver over all banks.
pub struct Gpio {
    regs: RegBlock,
}

impl Gpio {
    /// # Safety
    ///
    /// `base` must map [`PORT_COUNT`] contiguous GPIO banks.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegBlock::new(base, GPIO_LEN),
        }
    }

    pub fn set_as_input(&self, pin: PortPin) {
        unsafe { self.regs.clear_bits(pin.bank_offset() + DIR, pin.mask()) };
    }

    pub fn set_as_output(&self, pin: PortPin) {
        unsafe { self.regs.set_bits(pin.bank_offset() + DIR, pin.mask()) };
    }

    pub fn set_high(&self, pin: PortPin) {
        unsafe { self.regs.write_u32(pin.bank_offset() + SET, pin.mask()) };
    }

    pub fn set_low(&self, pin: PortPin) {
        unsafe { self.regs.write_u32(pin.bank_offset() + CLR, pin.mask()) };
    }

    pub fn set_level(&self, pin: PortPin, high: bool) {
        if high {
            self.set_high(pin);
        } else {
            self.set_low(pin);
        }
    }

    /// Instantaneous sampled level, regardless of configured direction.
    pub fn level(&self, pin: PortPin) -> bool {
        unsafe { self.regs.read_u32(pin.bank_offset() + PIN) & pin.mask() != 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peek(base: usize, offset: usize) -> u32 {
        unsafe { core::ptr::read_volatile((base + offset) as *const u32) }
    }

    fn poke(base: usize, offset: usize, value: u32) {
        unsafe { core::ptr::write_volatile((base + offset) as *mut u32, value) };
    }

    #[test]
    fn test_port_pin_validation() {
        assert!(PortPin::new(0, 0).is_ok());
        assert!(PortPin::new(2, 31).is_ok());
        assert_eq!(
            PortPin::new(PORT_COUNT, 0),
            Err(DriverError::InvalidPort { port: PORT_COUNT })
        );
        assert_eq!(
            PortPin::new(0, 32),
            Err(DriverError::InvalidPin { pin: 32 })
        );
    }

    #[test]
    fn test_direction_touches_one_bit() {
        let mut memory = [0u32; GPIO_LEN / 4];
        let base = memory.as_mut_ptr() as usize;
        let gpio = unsafe { Gpio::new(base) };
        let pin = PortPin::new(1, 5).unwrap();

        // Neighbours already configured as outputs stay put.
        poke(base, BANK_STRIDE + DIR, 1 << 9);
        gpio.set_as_output(pin);
        assert_eq!(peek(base, BANK_STRIDE + DIR), (1 << 9) | (1 << 5));
        assert_eq!(peek(base, DIR), 0);

        gpio.set_as_input(pin);
        assert_eq!(peek(base, BANK_STRIDE + DIR), 1 << 9);
    }

    #[test]
    fn test_set_as_output_is_idempotent() {
        let mut memory = [0u32; GPIO_LEN / 4];
        let base = memory.as_mut_ptr() as usize;
        let gpio = unsafe { Gpio::new(base) };
        let pin = PortPin::new(0, 18).unwrap();

        gpio.set_as_output(pin);
        let once = peek(base, DIR);
        gpio.set_as_output(pin);
        assert_eq!(peek(base, DIR), once);
    }

    #[test]
    fn test_level_writes_use_set_and_clear() {
        let mut memory = [0u32; GPIO_LEN / 4];
        let base = memory.as_mut_ptr() as usize;
        let gpio = unsafe { Gpio::new(base) };
        let pin = PortPin::new(2, 3).unwrap();

        gpio.set_high(pin);
        assert_eq!(peek(base, 2 * BANK_STRIDE + SET), 1 << 3);

        gpio.set_low(pin);
        assert_eq!(peek(base, 2 * BANK_STRIDE + CLR), 1 << 3);

        gpio.set_level(pin, true);
        assert_eq!(peek(base, 2 * BANK_STRIDE + SET), 1 << 3);
    }

    #[test]
    fn test_level_samples_pin_register() {
        let mut memory = [0u32; GPIO_LEN / 4];
        let base = memory.as_mut_ptr() as usize;
        let gpio = unsafe { Gpio::new(base) };
        let pin = PortPin::new(1, 15).unwrap();

        assert!(!gpio.level(pin));
        poke(base, BANK_STRIDE + PIN, 1 << 15);
        assert!(gpio.level(pin));
    }
}
