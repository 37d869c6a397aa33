//! Interrupt-driven UART receive pipeline.
//!
//! Channel state machine: polled only, until a one-way switch to
//! interrupt-driven receive. [`Uart::enable_receive_interrupt`] creates the
//! channel's single-slot queue, binds the service routine to the channel's
//! interrupt line and sets the receive enable. From then on arriving bytes
//! flow ISR to task:
//!
//! 1. Hardware latches receive-data-available and asserts the line.
//! 2. The service routine drains the holding register and performs a
//!    non-blocking overwrite-send into the queue. A displaced unread byte
//!    is counted, not an error; the slot always holds the newest byte.
//! 3. A task blocks in [`Uart::get_char_from_queue`] until the byte lands
//!    or its timeout expires.
//!
//! Once enabled, [`Uart::polled_read`] must not be used on the channel; both
//! paths consume the same data-ready condition and the holding register only
//! loads once.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

use rtos_shim::irq;
use rtos_shim::queue::ByteQueue;
use rtos_shim::time::Ticks;

use crate::mmio::RegBlock;
use crate::uart::{
    InterruptEnable, LineStatus, Uart, IER, IIR, IIR_NO_INTERRUPT_PENDING, LSR, RBR,
};
use crate::{DriverError, Result};

/// State shared between a channel's interrupt service and its consumer task.
pub(crate) struct RxShared {
    regs: RegBlock,
    queue: ByteQueue,
    overruns: AtomicU32,
}

impl RxShared {
    fn new(regs: RegBlock) -> Self {
        Self {
            regs,
            queue: ByteQueue::new(),
            overruns: AtomicU32::new(0),
        }
    }

    /// One service pass, run in interrupt context. Never blocks; the only
    /// side effects are the register accesses and the queue send.
    fn service(&self) {
        let identification = unsafe { self.regs.read_u32(IIR) };
        if identification & IIR_NO_INTERRUPT_PENDING != 0 {
            return;
        }
        let status = LineStatus::from_bits_retain(unsafe { self.regs.read_u32(LSR) });
        if !status.contains(LineStatus::RX_DATA_READY) {
            return;
        }
        let byte = unsafe { self.regs.read_u32(RBR) } as u8;
        if self.queue.send_overwrite_from_isr(byte).displaced() {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Uart {
    /// Switch the channel to interrupt-driven receive. One-way; a second
    /// call fails with [`DriverError::RxAlreadyEnabled`].
    ///
    /// # Safety
    ///
    /// Call during single-threaded setup, before the channel's interrupt
    /// line can fire. The registration this performs is unsynchronized
    /// against live interrupts.
    pub unsafe fn enable_receive_interrupt(&mut self) -> Result<()> {
        if self.rx.is_some() {
            return Err(DriverError::RxAlreadyEnabled);
        }
        let line = self.id.irq_line();
        let shared = Arc::new(RxShared::new(self.regs));

        let isr_shared = Arc::clone(&shared);
        irq::register_handler(line, Box::new(move || isr_shared.service()))?;
        irq::enable_line(line)?;
        self.regs
            .set_bits(IER, InterruptEnable::RX_DATA_AVAILABLE.bits());

        self.rx = Some(shared);
        log::debug!(
            "uart{}: receive interrupts enabled on line {}",
            self.id.index(),
            line.0
        );
        Ok(())
    }

    /// Take the next interrupt-delivered byte, suspending the calling task
    /// for up to `timeout`. `Ok(None)` is a timeout; calling before
    /// [`Uart::enable_receive_interrupt`] is an error.
    pub fn get_char_from_queue(&self, timeout: Ticks) -> Result<Option<u8>> {
        match &self.rx {
            Some(shared) => Ok(shared.queue.receive(timeout)),
            None => Err(DriverError::RxNotEnabled),
        }
    }

    /// Bytes displaced from the slot before any task read them. Zero until
    /// receive interrupts are enabled.
    pub fn overrun_count(&self) -> u32 {
        match &self.rx {
            Some(shared) => shared.overruns.load(Ordering::Relaxed),
            None => 0,
        }
    }
}
