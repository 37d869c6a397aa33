//! # LPC40xx Peripheral Driver Layer
//!
//! GPIO, UART and SSP drivers for application tasks running on a preemptive
//! scheduler, including the interrupt-to-task hand-off paths: edge-triggered
//! GPIO dispatch (one shared line multiplexed across 32 pins) and
//! interrupt-driven UART receive into a single-slot queue.
//!
//! # Purpose
//!
//! - Resolve (port, pin) addresses and drive single GPIO lines
//! - Multiplex the bank-0 edge interrupt across per-pin callbacks
//! - Program UART baud divisors and move received bytes into task context
//! - Exchange bytes on the SSP bus behind a clock prescaler
//!
//! # Architecture
//!
//! 1. Board layer constructs each driver over its peripheral block's base
//!    address (`const unsafe fn new`).
//! 2. Setup code routes pins (IOCON), powers peripherals (SYSCON) and
//!    registers interrupt callbacks while it still holds exclusive borrows.
//! 3. Drivers are then shared with tasks; interrupt entries
//!    ([`gpio_int::GpioInterrupts::dispatch`] and the UART receive service)
//!    run in interrupt context and hand off through `rtos-shim` queues and
//!    signals.
//!
//! # Testing Strategy
//!
//! Register blocks are plain buffers in tests: unit tests poke status bits
//! and inspect the cells drivers wrote, and the integration tests drive the
//! full interrupt pipeline through the mock `rtos-shim` backend. Nothing here
//! requires hardware.
//!
//! The boxed-callback paths use `alloc`; on target the embedding image
//! provides the allocator.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

extern crate alloc;

pub mod gpio;
pub mod gpio_int;
pub mod iocon;
pub mod mmio;
pub mod ssp;
pub mod syscon;
pub mod uart;
pub mod uart_rx;

use thiserror::Error;

/// Driver-layer failures. Configuration problems surface here; data-path
/// overruns are counters, not errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("port {port} is out of range")]
    InvalidPort { port: u8 },
    #[error("pin {pin} is out of range")]
    InvalidPin { pin: u8 },
    #[error("pin function {function:#05b} is out of range")]
    InvalidPinFunction { function: u8 },
    #[error("GPIO port {port} has no edge-interrupt support")]
    PortWithoutInterrupts { port: u8 },
    #[error("invalid baud rate {baud_rate}")]
    InvalidBaudRate { baud_rate: u32 },
    #[error("baud rate {baud_rate} is not reachable from a {source_clock_hz} Hz clock")]
    UnachievableBaudRate { source_clock_hz: u32, baud_rate: u32 },
    #[error("bus clock {max_bus_clock_hz} Hz is not reachable from a {source_clock_hz} Hz clock")]
    UnachievableBusClock { source_clock_hz: u32, max_bus_clock_hz: u32 },
    #[error("timed out waiting on a peripheral status bit")]
    SpinTimeout,
    #[error("receive interrupts are already enabled on this channel")]
    RxAlreadyEnabled,
    #[error("receive interrupts have not been enabled on this channel")]
    RxNotEnabled,
    #[error("RTOS service failure: {0}")]
    Rtos(#[from] rtos_shim::RtosError),
}

pub type Result<T> = core::result::Result<T, DriverError>;

/// Bound on a status-bit busy-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinLimit {
    /// Spin until the condition holds. Task context only.
    Forever,
    /// Give up with [`DriverError::SpinTimeout`] after this many polls.
    Count(u32),
}

/// Poll `busy` until it clears, within `limit`. `Count(0)` checks exactly
/// once.
pub(crate) fn spin_while(limit: SpinLimit, mut busy: impl FnMut() -> bool) -> Result<()> {
    match limit {
        SpinLimit::Forever => {
            while busy() {
                core::hint::spin_loop();
            }
            Ok(())
        }
        SpinLimit::Count(polls) => {
            for _ in 0..polls {
                if !busy() {
                    return Ok(());
                }
                core::hint::spin_loop();
            }
            if busy() {
                Err(DriverError::SpinTimeout)
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_ready_immediately() {
        assert_eq!(spin_while(SpinLimit::Count(0), || false), Ok(()));
        assert_eq!(spin_while(SpinLimit::Forever, || false), Ok(()));
    }

    #[test]
    fn test_spin_times_out_when_never_ready() {
        let mut polls = 0;
        let result = spin_while(SpinLimit::Count(8), || {
            polls += 1;
            true
        });
        assert_eq!(result, Err(DriverError::SpinTimeout));
        assert_eq!(polls, 9);
    }

    #[test]
    fn test_spin_observes_late_ready() {
        let mut polls = 0;
        let result = spin_while(SpinLimit::Count(10), || {
            polls += 1;
            polls < 4
        });
        assert_eq!(result, Ok(()));
    }
}
