// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Free-running microsecond counter.
///
/// The counter is 32 bit and wraps roughly every 71 minutes; every consumer in this
/// crate measures intervals with `wrapping_sub`, so the rollover is invisible as long as
/// a single interval stays below that span.
pub trait MicrosClock {
    /// Current counter value in microseconds.
    fn now_us(&self) -> u32;

    /// Microseconds elapsed since `since`, rollover safe.
    #[inline(always)]
    fn elapsed_us(&self, since: u32) -> u32 {
        self.now_us().wrapping_sub(since)
    }
}

impl<C: MicrosClock + ?Sized> MicrosClock for &C {
    #[inline(always)]
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use core::cell::Cell;

    use super::MicrosClock;

    /// Manually advanced clock for host tests.
    #[derive(Default)]
    pub struct MockClock {
        now: Cell<u32>,
    }

    impl MockClock {
        pub fn starting_at(us: u32) -> Self {
            Self { now: Cell::new(us) }
        }

        pub fn advance(&self, us: u32) {
            self.now.set(self.now.get().wrapping_add(us));
        }
    }

    impl MicrosClock for MockClock {
        fn now_us(&self) -> u32 {
            self.now.get()
        }
    }

    /// Clock that moves `step` microseconds on every read, so code that times
    /// itself sees a nonzero cost.
    pub struct SteppingClock {
        now: Cell<u32>,
        step: u32,
    }

    impl SteppingClock {
        pub fn new(step: u32) -> Self {
            Self {
                now: Cell::new(0),
                step,
            }
        }

        pub fn set(&self, us: u32) {
            self.now.set(us);
        }

        /// Value the next read returns, without moving the clock.
        pub fn peek(&self) -> u32 {
            self.now.get()
        }
    }

    impl MicrosClock for SteppingClock {
        fn now_us(&self) -> u32 {
            let now = self.now.get();
            self.now.set(now.wrapping_add(self.step));
            now
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockClock;
    use super::MicrosClock;

    #[test]
    fn elapsed_survives_rollover() {
        let clock = MockClock::starting_at(u32::MAX - 9);
        let start = clock.now_us();
        clock.advance(25);
        assert_eq!(clock.elapsed_us(start), 25);
    }
}
