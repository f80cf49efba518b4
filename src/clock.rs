use {
    embedded_hal::blocking::delay::DelayUs,
    linux_embedded_hal::Delay,
    std::{
        convert::TryFrom,
        time::{Duration, Instant},
    },
};

/// Monotonic time source used to track when a measurement was started.
pub trait Clock {
    /// Time elapsed since a fixed, arbitrary origin.
    fn now(&self) -> Duration;

    /// Blocks until `duration` has passed.
    fn wait(&self, duration: Duration);
}

/// `Clock` backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wait(&self, duration: Duration) {
        let us = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
        Delay.delay_us(us);
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use {
        super::Clock,
        std::{cell::Cell, rc::Rc, time::Duration},
    };

    /// Manually advanced clock. Clones share the same time.
    #[derive(Debug, Clone, Default)]
    pub struct FakeClock(Rc<Cell<Duration>>);

    impl FakeClock {
        pub fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Duration {
            self.0.get()
        }

        fn wait(&self, duration: Duration) {
            self.advance(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn monotonic_clock_waits() {
        let clock = MonotonicClock::new();
        let before = clock.now();
        clock.wait(Duration::from_millis(2));
        assert!(clock.now() - before >= Duration::from_millis(2));
    }

    #[test]
    fn fake_clock_clones_share_time() {
        let clock = fake::FakeClock::default();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(7));
        assert_eq!(clock.now(), Duration::from_millis(7));
    }
}
