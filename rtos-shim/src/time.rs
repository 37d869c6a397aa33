//! Tick-based timeouts and task delay.
//!
//! All blocking shim operations take a [`Ticks`] bound. [`NO_WAIT`] polls
//! once; [`FOREVER`] waits without bound.

/// Scheduler tick rate assumed by the tick/millisecond conversions.
pub const TICK_RATE_HZ: u32 = 1_000;

/// A duration measured in scheduler ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticks(pub u32);

/// Zero-tick timeout: check once, never suspend.
pub const NO_WAIT: Ticks = Ticks(0);

/// Sentinel timeout meaning "wait until the event happens".
pub const FOREVER: Ticks = Ticks(u32::MAX);

impl Ticks {
    /// Convert wall milliseconds to ticks, saturating to [`FOREVER`].
    pub const fn from_ms(ms: u32) -> Self {
        let ticks = ms as u64 * TICK_RATE_HZ as u64 / 1_000;
        if ticks >= FOREVER.0 as u64 {
            FOREVER
        } else {
            Ticks(ticks as u32)
        }
    }

    pub const fn is_forever(self) -> bool {
        self.0 == FOREVER.0
    }

    #[cfg(feature = "mock")]
    pub(crate) fn as_duration(self) -> std::time::Duration {
        std::time::Duration::from_millis(self.0 as u64 * 1_000 / TICK_RATE_HZ as u64)
    }
}

/// Block the calling task for `duration`.
pub fn sleep(duration: Ticks) {
    #[cfg(feature = "mock")]
    std::thread::sleep(duration.as_duration());

    #[cfg(feature = "runtime")]
    unsafe {
        crate::sys::rtos_task_delay(duration.0)
    };
}
