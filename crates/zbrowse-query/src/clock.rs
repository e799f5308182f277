//! Injectable clock so ping measurement is deterministic under test,
//! generalizing the direct `Instant::now()` calls this workspace otherwise
//! makes at each call site.

use std::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Delegates straight to [`std::time::Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Clock;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    /// A clock the test advances manually, so `ping_ms` assertions don't
    /// depend on real wall-clock timing.
    pub struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut guard = self.now.lock();
            *guard += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }
    }
}
