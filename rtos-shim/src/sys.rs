//! Kernel port layer bindings (runtime backend).
//!
//! The embedding image provides these symbols; they map one-to-one onto the
//! scheduler's native queue/semaphore/task/interrupt services. All of them
//! marked `_from_isr` must be callable from interrupt context.

use core::ffi::c_void;

extern "C" {
    /// Create a capacity-one byte queue; the handle is opaque.
    pub fn rtos_byte_queue_create() -> usize;

    /// Overwriting send; returns nonzero if an unread byte was displaced.
    pub fn rtos_byte_queue_overwrite_from_isr(queue: usize, byte: u8) -> u32;

    /// Blocking receive; false on timeout. `u32::MAX` ticks waits forever.
    pub fn rtos_byte_queue_receive(queue: usize, byte_out: *mut u8, ticks: u32) -> bool;

    /// Create a binary semaphore; the handle is opaque.
    pub fn rtos_signal_create() -> usize;

    pub fn rtos_signal_give(signal: usize);

    pub fn rtos_signal_give_from_isr(signal: usize);

    /// Blocking take; false on timeout. `u32::MAX` ticks waits forever.
    pub fn rtos_signal_take(signal: usize, ticks: u32) -> bool;

    /// Create a task; false if the scheduler is out of resources.
    pub fn rtos_task_create(
        entry: extern "C" fn(*mut c_void),
        argument: *mut c_void,
        name: *const u8,
        name_len: usize,
        stack_words: usize,
        priority: u8,
    ) -> bool;

    /// Terminate the calling task.
    pub fn rtos_task_exit() -> !;

    /// Block the calling task for `ticks`.
    pub fn rtos_task_delay(ticks: u32);

    /// Unmask an interrupt line at the vectored interrupt controller.
    pub fn rtos_irq_enable(line: u32);
}
