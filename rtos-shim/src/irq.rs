//! Interrupt-line registry and control.
//!
//! Drivers bind a boxed handler to a vectored interrupt line, then enable the
//! line. Handlers run in interrupt context on the target (and synchronously
//! inside [`raise`] under the mock backend), so they must not block or
//! allocate.
//!
//! Registration happens during single-threaded setup, before the line is
//! enabled; the table is read-only once interrupts can fire.

use alloc::boxed::Box;

use crate::Result;

/// Number of lines on the vectored interrupt controller.
pub const MAX_IRQ_LINES: usize = 64;

/// Interrupt line number on the vectored interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLine(pub u32);

/// Runs in interrupt context; must not block or allocate.
pub type IrqHandler = Box<dyn Fn() + Send + Sync>;

// ========== Mock Mode ==========

#[cfg(feature = "mock")]
mod imp {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use super::{IrqHandler, IrqLine, MAX_IRQ_LINES};
    use crate::{Result, RtosError};

    struct Entry {
        handler: Option<IrqHandler>,
        enabled: bool,
    }

    const EMPTY: Entry = Entry {
        handler: None,
        enabled: false,
    };

    static REGISTRY: Mutex<[Entry; MAX_IRQ_LINES]> = Mutex::new([EMPTY; MAX_IRQ_LINES]);

    fn lock_registry() -> MutexGuard<'static, [Entry; MAX_IRQ_LINES]> {
        REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub unsafe fn register_handler(line: IrqLine, handler: IrqHandler) -> Result<()> {
        let index = check_line(line)?;
        let mut registry = lock_registry();
        if registry[index].handler.is_some() {
            return Err(RtosError::IrqLineTaken { line: line.0 });
        }
        registry[index].handler = Some(handler);
        log::debug!("irq: handler registered for line {}", line.0);
        Ok(())
    }

    pub fn enable_line(line: IrqLine) -> Result<()> {
        let index = check_line(line)?;
        lock_registry()[index].enabled = true;
        Ok(())
    }

    /// Fire `line` as the hardware would: runs the registered handler
    /// synchronously if the line is enabled. Returns whether a handler ran.
    ///
    /// Test hook. The registry lock is held across the call, so handlers must
    /// not call back into this module.
    pub fn raise(line: IrqLine) -> bool {
        let Ok(index) = check_line(line) else {
            return false;
        };
        let registry = lock_registry();
        let entry = &registry[index];
        match (&entry.handler, entry.enabled) {
            (Some(handler), true) => {
                handler();
                true
            }
            _ => false,
        }
    }

    fn check_line(line: IrqLine) -> Result<usize> {
        if (line.0 as usize) < MAX_IRQ_LINES {
            Ok(line.0 as usize)
        } else {
            Err(RtosError::IrqLineOutOfRange { line: line.0 })
        }
    }
}

// ========== Runtime Mode ==========

#[cfg(feature = "runtime")]
mod imp {
    use core::cell::UnsafeCell;

    use super::{IrqHandler, IrqLine, MAX_IRQ_LINES};
    use crate::{sys, Result, RtosError};

    struct HandlerTable(UnsafeCell<[Option<IrqHandler>; MAX_IRQ_LINES]>);

    // Written only during single-threaded setup, read only from the
    // interrupt entry afterwards.
    unsafe impl Sync for HandlerTable {}

    const EMPTY: Option<IrqHandler> = None;

    static HANDLERS: HandlerTable = HandlerTable(UnsafeCell::new([EMPTY; MAX_IRQ_LINES]));

    pub unsafe fn register_handler(line: IrqLine, handler: IrqHandler) -> Result<()> {
        let index = check_line(line)?;
        let table = &mut *HANDLERS.0.get();
        if table[index].is_some() {
            return Err(RtosError::IrqLineTaken { line: line.0 });
        }
        table[index] = Some(handler);
        log::debug!("irq: handler registered for line {}", line.0);
        Ok(())
    }

    pub fn enable_line(line: IrqLine) -> Result<()> {
        check_line(line)?;
        unsafe { sys::rtos_irq_enable(line.0) };
        Ok(())
    }

    /// Interrupt entry the kernel port layer vectors into (exported as
    /// `rtos_shim_irq_entry`). Lines with no registered handler are ignored.
    #[export_name = "rtos_shim_irq_entry"]
    pub unsafe extern "C" fn irq_entry(line: u32) {
        let table = &*HANDLERS.0.get();
        if let Some(Some(handler)) = table.get(line as usize) {
            handler();
        }
    }

    fn check_line(line: IrqLine) -> Result<usize> {
        if (line.0 as usize) < MAX_IRQ_LINES {
            Ok(line.0 as usize)
        } else {
            Err(RtosError::IrqLineOutOfRange { line: line.0 })
        }
    }
}

/// Bind `handler` to `line`. Fails if the line is out of range or taken.
///
/// # Safety
///
/// Must be called during single-threaded setup, before `line` is enabled;
/// the table is unsynchronized against a line that can already fire.
pub unsafe fn register_handler(line: IrqLine, handler: IrqHandler) -> Result<()> {
    imp::register_handler(line, handler)
}

/// Unmask `line` at the interrupt controller.
pub fn enable_line(line: IrqLine) -> Result<()> {
    imp::enable_line(line)
}

#[cfg(feature = "mock")]
pub use imp::raise;

#[cfg(feature = "runtime")]
pub use imp::irq_entry;
