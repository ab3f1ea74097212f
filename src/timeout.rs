//! Deadline bookkeeping for the byte-wise read loop.
//!
//! A [Timeout](struct.Timeout.html) is armed with the same duration the
//! transport uses for a single read and is polled between bytes. It never
//! blocks by itself.

use std::time::{Duration, Instant};

use err::TimeoutError;

/// Source of monotonic timestamps.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The process-wide monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<'a, C: Clock> Clock for &'a C {
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Remaining-time tracker for a single read.
///
/// * `None` blocks forever: `time_left` is `None` and it never expires.
/// * A zero duration is non-blocking: `time_left` is zero and it is always
///   expired.
/// * Any other duration expires once the deadline has passed.
#[derive(Debug)]
pub struct Timeout<C = MonotonicClock> {
    clock: C,
    duration: Option<Duration>,
    target: Option<Instant>,
    is_infinite: bool,
    is_non_blocking: bool,
}

impl Timeout<MonotonicClock> {
    pub fn new(duration: Option<Duration>) -> Self {
        Timeout::with_clock(duration, MonotonicClock)
    }
}

impl<C: Clock> Timeout<C> {
    /// A duration whose deadline cannot be represented as an `Instant`
    /// behaves like `None`.
    pub fn with_clock(duration: Option<Duration>, clock: C) -> Self {
        let target = duration.and_then(|d| clock.now().checked_add(d));
        Timeout {
            clock,
            duration,
            target,
            is_infinite: target.is_none(),
            is_non_blocking: duration == Some(Duration::from_secs(0)),
        }
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.is_infinite
    }

    #[inline]
    pub fn is_non_blocking(&self) -> bool {
        self.is_non_blocking
    }

    #[inline]
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn expired(&mut self) -> bool {
        self.target.is_some() && self.time_left() == Some(Duration::from_secs(0))
    }

    /// Time until the deadline, `None` when blocking forever.
    ///
    /// If the remaining time is larger than the armed duration the clock went
    /// backwards; the deadline is then re-armed from the current instant and
    /// the full duration is reported.
    pub fn time_left(&mut self) -> Option<Duration> {
        if self.is_non_blocking {
            return Some(Duration::from_secs(0));
        }
        let (duration, target) = match (self.duration, self.target) {
            (Some(d), Some(t)) => (d, t),
            _ => return None,
        };
        let now = self.clock.now();
        match target.checked_duration_since(now) {
            Some(delta) if delta > duration => {
                if let Some(rearmed) = now.checked_add(duration) {
                    self.target = Some(rearmed);
                }
                Some(duration)
            }
            Some(delta) => Some(delta),
            None => Some(Duration::from_secs(0)),
        }
    }

    /// Re-arm the deadline `duration` from now.
    pub fn restart(&mut self, duration: Duration) -> Result<(), TimeoutError> {
        if self.is_infinite {
            return Err(TimeoutError::InvalidState(
                "cannot restart a timeout that blocks forever",
            ));
        }
        let target = match self.clock.now().checked_add(duration) {
            Some(target) => target,
            None => return Err(TimeoutError::InvalidState("deadline out of range")),
        };
        self.duration = Some(duration);
        self.is_non_blocking = duration == Duration::from_secs(0);
        self.target = Some(target);
        Ok(())
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
pub(crate) mod manual {
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    use super::Clock;

    #[derive(Debug)]
    pub struct ManualClock {
        now: Cell<Instant>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            // Leave room to step backwards without underflowing `Instant`.
            ManualClock {
                now: Cell::new(Instant::now() + Duration::from_secs(3600)),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }

        pub fn rewind(&self, by: Duration) {
            self.now.set(self.now.get() - by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }
}
