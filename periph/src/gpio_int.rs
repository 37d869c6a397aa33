//! Edge-triggered GPIO interrupt dispatch for bank 0.
//!
//! The bank shares one processor interrupt line across 32 pins; this module
//! multiplexes it through a fixed per-pin callback table.
//!
//! # Architecture
//!
//! 1. Setup code attaches per-pin callbacks while it holds the exclusive
//!    borrow and the bank's line is still masked.
//! 2. The table is frozen behind a shared borrow (typically an `Arc` handed
//!    to the interrupt registry) and the line is enabled.
//! 3. Hardware latches an edge and the vector calls [`GpioInterrupts::dispatch`].
//! 4. `dispatch` scans both edge status words, runs each pending pin's
//!    callback exactly once in ascending pin order, and acks every serviced
//!    pin through the clear register before returning.
//!
//! Callbacks run in interrupt context: no blocking, no allocation. Hand off
//! to tasks through `rtos_shim::signal` or `rtos_shim::queue`.

use alloc::boxed::Box;
use core::sync::atomic::{AtomicU32, Ordering};

use rtos_shim::irq::IrqLine;
use static_assertions::const_assert_eq;

use crate::gpio::{PortPin, PINS_PER_PORT};
use crate::mmio::RegBlock;
use crate::{DriverError, Result};

/// Processor interrupt line the GPIO banks share.
pub const GPIO_IRQ_LINE: IrqLine = IrqLine(38);

// Bank-0 interrupt block offsets. +0x00 is the bank-level pending summary,
// which dispatch does not need.
const STAT_RISING: usize = 0x04; // Latched rising edges
const STAT_FALLING: usize = 0x08; // Latched falling edges
const INT_CLEAR: usize = 0x0C; // Write 1: ack both latches for the pin
const EN_RISING: usize = 0x10; // Rising-edge enables
const EN_FALLING: usize = 0x14; // Falling-edge enables

/// Window length of the bank-0 interrupt block.
pub const GPIO_INT_LEN: usize = 0x18;

/// Callback slots, one per line of the bank.
pub const PIN_COUNT: usize = PINS_PER_PORT as usize;

const_assert_eq!(PIN_COUNT, u32::BITS as usize);

/// Transition that triggers a pin's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Runs in interrupt context; must not block or allocate.
pub type PinCallback = Box<dyn Fn() + Send + Sync>;

/// Dispatch table for the bank-0 edge interrupt.
pub struct GpioInterrupts {
    regs: RegBlock,
    slots: [Option<PinCallback>; PIN_COUNT],
    unhandled: AtomicU32,
}

impl GpioInterrupts {
    /// # Safety
    ///
    /// `base` must be the bank-0 interrupt block.
    pub const unsafe fn new(base: usize) -> Self {
        const EMPTY: Option<PinCallback> = None;
        Self {
            regs: RegBlock::new(base, GPIO_INT_LEN),
            slots: [EMPTY; PIN_COUNT],
            unhandled: AtomicU32::new(0),
        }
    }

    /// Register `callback` for `pin` on `edge` and enable that edge's latch.
    ///
    /// One slot per pin: a re-attach replaces the previous registration
    /// wholesale, including its edge selection. Call before the bank's
    /// interrupt line is enabled at the controller.
    pub fn attach(&mut self, pin: PortPin, edge: Edge, callback: PinCallback) -> Result<()> {
        if pin.port() != 0 {
            return Err(DriverError::PortWithoutInterrupts { port: pin.port() });
        }
        let mask = pin.mask();
        self.slots[pin.pin() as usize] = Some(callback);
        unsafe {
            self.regs.clear_bits(EN_RISING, mask);
            self.regs.clear_bits(EN_FALLING, mask);
            match edge {
                Edge::Rising => self.regs.set_bits(EN_RISING, mask),
                Edge::Falling => self.regs.set_bits(EN_FALLING, mask),
            }
        }
        log::debug!("gpio-int: pin {} attached on {:?} edge", pin.pin(), edge);
        Ok(())
    }

    /// Single interrupt-service entry point for the bank.
    ///
    /// Every pin pending in either status word at entry gets its callback
    /// invoked exactly once (a pin latched on both edges still runs once),
    /// in ascending pin order. All serviced pins are acked with one clear
    /// write before returning, so none re-fires.
    pub fn dispatch(&self) {
        let rising = unsafe { self.regs.read_u32(STAT_RISING) };
        let falling = unsafe { self.regs.read_u32(STAT_FALLING) };
        let pending = rising | falling;
        if pending == 0 {
            return;
        }

        let mut remaining = pending;
        while remaining != 0 {
            let pin = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            match &self.slots[pin] {
                Some(callback) => callback(),
                None => {
                    self.unhandled.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        unsafe { self.regs.write_u32(INT_CLEAR, pending) };
    }

    /// Interrupts taken on pins that never got a callback. These are acked
    /// like any other pin so they cannot wedge the bank.
    pub fn unhandled_count(&self) -> u32 {
        self.unhandled.load(Ordering::Relaxed)
    }
}
