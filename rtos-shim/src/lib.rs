//! # RTOS Service Shim
//!
//! Unified access to the scheduler services the driver layer consumes:
//! bounded queues, binary signals, tick delays, task creation and interrupt
//! lines. Two backends sit behind one API:
//! - **Mock Mode**: std-based services, runs on any host
//! - **Runtime Mode**: extern "C" bindings to the kernel port layer
//!
//! ## Usage
//!
//! ```rust
//! use rtos_shim::{queue::ByteQueue, time};
//!
//! let rx = ByteQueue::new();
//! let tx = rx.clone();
//! tx.send_overwrite_from_isr(b'!');
//! assert_eq!(rx.receive(time::NO_WAIT), Some(b'!'));
//! ```
//!
//! ## Build Modes
//!
//! ```bash
//! # Mock (default - host development and tests)
//! cargo build
//!
//! # Kernel port layer
//! cargo build --no-default-features --features runtime
//! ```
//!
//! In runtime mode the embedding image provides the `rtos_*` port symbols and
//! a global allocator, and vectors interrupts into the exported
//! `rtos_shim_irq_entry` symbol.

#![no_std]

#[cfg(any(test, feature = "mock"))]
#[macro_use]
extern crate std;

extern crate alloc;

pub mod config;
pub mod irq;
pub mod queue;
pub mod signal;
pub mod task;
pub mod time;

#[cfg(feature = "runtime")]
pub mod sys;

use thiserror::Error;

/// Failures surfaced by the shim itself. Backend calls that can only fail by
/// misconfiguration report through these; data-path timeouts are not errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RtosError {
    #[error("IRQ line {line} is out of range")]
    IrqLineOutOfRange { line: u32 },
    #[error("IRQ line {line} already has a registered handler")]
    IrqLineTaken { line: u32 },
    #[error("task `{name}` could not be created")]
    TaskCreateFailed { name: &'static str },
}

pub type Result<T> = core::result::Result<T, RtosError>;
