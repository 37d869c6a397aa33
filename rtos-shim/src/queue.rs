//! Single-slot byte queue: the interrupt-to-task hand-off channel.
//!
//! The producer side is a non-blocking overwrite (safe to call from interrupt
//! context); a send into a full slot displaces the unread byte and reports it
//! so the caller can account for the loss. The consumer side blocks with a
//! tick timeout. Handles are cheap clones so an ISR closure and a task can
//! share one queue.

/// What happened to the slot on a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The slot was empty; the byte was stored.
    Stored,
    /// The slot held an unread byte, which this send displaced.
    Displaced,
}

impl SendOutcome {
    pub const fn displaced(self) -> bool {
        matches!(self, SendOutcome::Displaced)
    }
}

// ========== Mock Mode ==========

#[cfg(feature = "mock")]
mod imp {
    use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

    use super::SendOutcome;
    use crate::time::Ticks;

    struct Shared {
        slot: Mutex<Option<u8>>,
        ready: Condvar,
    }

    /// Capacity-one byte queue (mock backend).
    ///
    /// The "interrupt-safe" producer path is an ordinary lock here; in mock
    /// mode the ISR is just another host thread.
    #[derive(Clone)]
    pub struct ByteQueue {
        shared: Arc<Shared>,
    }

    impl ByteQueue {
        pub fn new() -> Self {
            Self {
                shared: Arc::new(Shared {
                    slot: Mutex::new(None),
                    ready: Condvar::new(),
                }),
            }
        }

        fn lock_slot(&self) -> MutexGuard<'_, Option<u8>> {
            self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Store `byte`, displacing any unread byte. Never blocks on a full
        /// slot.
        pub fn send_overwrite_from_isr(&self, byte: u8) -> SendOutcome {
            let mut slot = self.lock_slot();
            let displaced = slot.replace(byte).is_some();
            self.shared.ready.notify_one();
            if displaced {
                SendOutcome::Displaced
            } else {
                SendOutcome::Stored
            }
        }

        /// Take the stored byte, suspending the caller for up to `timeout`.
        pub fn receive(&self, timeout: Ticks) -> Option<u8> {
            let slot = self.lock_slot();
            if timeout.is_forever() {
                let mut slot = slot;
                while slot.is_none() {
                    slot = self
                        .shared
                        .ready
                        .wait(slot)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                slot.take()
            } else {
                let (mut slot, _) = self
                    .shared
                    .ready
                    .wait_timeout_while(slot, timeout.as_duration(), |slot| slot.is_none())
                    .unwrap_or_else(PoisonError::into_inner);
                slot.take()
            }
        }
    }
}

// ========== Runtime Mode ==========

#[cfg(feature = "runtime")]
mod imp {
    use super::SendOutcome;
    use crate::sys;
    use crate::time::Ticks;

    /// Capacity-one byte queue backed by the kernel port layer.
    #[derive(Clone)]
    pub struct ByteQueue {
        handle: usize,
    }

    impl ByteQueue {
        pub fn new() -> Self {
            Self {
                handle: unsafe { sys::rtos_byte_queue_create() },
            }
        }

        pub fn send_overwrite_from_isr(&self, byte: u8) -> SendOutcome {
            let displaced = unsafe { sys::rtos_byte_queue_overwrite_from_isr(self.handle, byte) };
            if displaced != 0 {
                SendOutcome::Displaced
            } else {
                SendOutcome::Stored
            }
        }

        pub fn receive(&self, timeout: Ticks) -> Option<u8> {
            let mut byte = 0u8;
            let received =
                unsafe { sys::rtos_byte_queue_receive(self.handle, &mut byte, timeout.0) };
            received.then_some(byte)
        }
    }
}

pub use imp::ByteQueue;

#[cfg(all(test, feature = "mock"))]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::time::{Ticks, FOREVER, NO_WAIT};

    #[test]
    fn test_send_then_receive() {
        let queue = ByteQueue::new();
        assert_eq!(queue.send_overwrite_from_isr(b'x'), SendOutcome::Stored);
        assert_eq!(queue.receive(NO_WAIT), Some(b'x'));
        assert_eq!(queue.receive(NO_WAIT), None);
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let queue = ByteQueue::new();
        assert_eq!(queue.send_overwrite_from_isr(b'1'), SendOutcome::Stored);
        assert_eq!(queue.send_overwrite_from_isr(b'2'), SendOutcome::Displaced);
        assert_eq!(queue.receive(NO_WAIT), Some(b'2'));
        assert_eq!(queue.receive(NO_WAIT), None);
    }

    #[test]
    fn test_receive_no_wait_returns_immediately() {
        let queue = ByteQueue::new();
        let start = Instant::now();
        assert_eq!(queue.receive(NO_WAIT), None);
        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[test]
    fn test_receive_blocks_until_send() {
        let queue = ByteQueue::new();
        let producer = queue.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            producer.send_overwrite_from_isr(b'k');
        });
        assert_eq!(queue.receive(FOREVER), Some(b'k'));
    }

    #[test]
    fn test_receive_timeout_expires() {
        let queue = ByteQueue::new();
        let start = Instant::now();
        assert_eq!(queue.receive(Ticks::from_ms(20)), None);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
