//! System control block: peripheral power-up.

use crate::mmio::RegBlock;

const PCONP: usize = 0xC4; // Peripheral power control

/// Window length covering the registers this layer touches.
pub const SYSCON_LEN: usize = 0xC8;

/// Peripherals with a power-enable bit used by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Ssp2,
    Uart2,
    Uart3,
}

impl Peripheral {
    const fn pconp_bit(self) -> u32 {
        match self {
            Peripheral::Ssp2 => 20,
            Peripheral::Uart2 => 24,
            Peripheral::Uart3 => 25,
        }
    }
}

/// System control block driver.
pub struct Syscon {
    regs: RegBlock,
}

impl Syscon {
    /// # Safety
    ///
    /// `base` must be the system control block.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegBlock::new(base, SYSCON_LEN),
        }
    }

    /// Gate clock and power onto `peripheral`. Idempotent.
    pub fn power_on(&self, peripheral: Peripheral) {
        unsafe { self.regs.set_bits(PCONP, 1 << peripheral.pconp_bit()) };
    }

    pub fn is_powered(&self, peripheral: Peripheral) -> bool {
        unsafe { self.regs.read_u32(PCONP) & (1 << peripheral.pconp_bit()) != 0 }
    }
}
