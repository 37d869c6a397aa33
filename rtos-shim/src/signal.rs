//! Binary signal: edge-to-task and task-to-task notification.
//!
//! A latched boolean with interrupt-safe give and blocking take. Multiple
//! gives before a take collapse into one; there is no counting.

// ========== Mock Mode ==========

#[cfg(feature = "mock")]
mod imp {
    use std::sync::{Arc, Condvar, Mutex, PoisonError};

    use crate::time::Ticks;

    struct Shared {
        raised: Mutex<bool>,
        wake: Condvar,
    }

    /// Binary signal (mock backend).
    #[derive(Clone)]
    pub struct BinarySignal {
        shared: Arc<Shared>,
    }

    impl BinarySignal {
        pub fn new() -> Self {
            Self {
                shared: Arc::new(Shared {
                    raised: Mutex::new(false),
                    wake: Condvar::new(),
                }),
            }
        }

        fn raise(&self) {
            let mut raised = self
                .shared
                .raised
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *raised = true;
            self.shared.wake.notify_one();
        }

        /// Latch the signal from task context.
        pub fn give(&self) {
            self.raise();
        }

        /// Latch the signal from interrupt context. Never blocks.
        pub fn give_from_isr(&self) {
            self.raise();
        }

        /// Consume the signal, suspending the caller for up to `timeout`.
        /// Returns false if the timeout expired first.
        pub fn take(&self, timeout: Ticks) -> bool {
            let raised = self
                .shared
                .raised
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if timeout.is_forever() {
                let mut raised = raised;
                while !*raised {
                    raised = self
                        .shared
                        .wake
                        .wait(raised)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                *raised = false;
                true
            } else {
                let (mut raised, _) = self
                    .shared
                    .wake
                    .wait_timeout_while(raised, timeout.as_duration(), |raised| !*raised)
                    .unwrap_or_else(PoisonError::into_inner);
                let taken = *raised;
                *raised = false;
                taken
            }
        }
    }
}

// ========== Runtime Mode ==========

#[cfg(feature = "runtime")]
mod imp {
    use crate::sys;
    use crate::time::Ticks;

    /// Binary signal backed by the kernel port layer.
    #[derive(Clone)]
    pub struct BinarySignal {
        handle: usize,
    }

    impl BinarySignal {
        pub fn new() -> Self {
            Self {
                handle: unsafe { sys::rtos_signal_create() },
            }
        }

        pub fn give(&self) {
            unsafe { sys::rtos_signal_give(self.handle) };
        }

        pub fn give_from_isr(&self) {
            unsafe { sys::rtos_signal_give_from_isr(self.handle) };
        }

        pub fn take(&self, timeout: Ticks) -> bool {
            unsafe { sys::rtos_signal_take(self.handle, timeout.0) }
        }
    }
}

pub use imp::BinarySignal;
