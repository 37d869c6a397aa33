//! Task creation on the preemptive scheduler.

use crate::Result;

/// Default stack allocation, in 32-bit words (4 KiB).
pub const DEFAULT_STACK_WORDS: usize = 1024;

/// Creation parameters for a scheduler task.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    pub name: &'static str,
    /// Stack size in 32-bit words.
    pub stack_words: usize,
    /// Scheduler priority; higher preempts lower.
    pub priority: u8,
}

impl TaskConfig {
    pub const fn new(name: &'static str, priority: u8) -> Self {
        Self {
            name,
            stack_words: DEFAULT_STACK_WORDS,
            priority,
        }
    }

    pub const fn with_stack_words(mut self, stack_words: usize) -> Self {
        self.stack_words = stack_words;
        self
    }
}

/// Hand `entry` to the scheduler as a new task. The task is detached; there
/// is no join.
#[cfg(feature = "mock")]
pub fn spawn(config: TaskConfig, entry: impl FnOnce() + Send + 'static) -> Result<()> {
    let spawned = std::thread::Builder::new()
        .name(config.name.into())
        .stack_size(config.stack_words * 4)
        .spawn(entry);
    match spawned {
        Ok(_) => {
            log::debug!(
                "task: `{}` spawned (priority {}, {} stack words)",
                config.name,
                config.priority,
                config.stack_words
            );
            Ok(())
        }
        Err(_) => Err(crate::RtosError::TaskCreateFailed { name: config.name }),
    }
}

/// Hand `entry` to the scheduler as a new task. The task is detached; if the
/// entry ever returns, the task exits through the port layer.
#[cfg(feature = "runtime")]
pub fn spawn(config: TaskConfig, entry: impl FnOnce() + Send + 'static) -> Result<()> {
    use alloc::boxed::Box;

    // Double-boxed so the trampoline receives a thin pointer.
    let entry: Box<Box<dyn FnOnce() + Send>> = Box::new(Box::new(entry));
    let argument = Box::into_raw(entry) as *mut core::ffi::c_void;
    let created = unsafe {
        crate::sys::rtos_task_create(
            trampoline,
            argument,
            config.name.as_ptr(),
            config.name.len(),
            config.stack_words,
            config.priority,
        )
    };
    if created {
        log::debug!("task: `{}` spawned (priority {})", config.name, config.priority);
        Ok(())
    } else {
        drop(unsafe { Box::from_raw(argument as *mut Box<dyn FnOnce() + Send>) });
        Err(crate::RtosError::TaskCreateFailed { name: config.name })
    }
}

#[cfg(feature = "runtime")]
extern "C" fn trampoline(argument: *mut core::ffi::c_void) {
    use alloc::boxed::Box;

    let entry = unsafe { Box::from_raw(argument as *mut Box<dyn FnOnce() + Send>) };
    entry();
    unsafe { crate::sys::rtos_task_exit() }
}
