//! Source of the current time.

use chrono::{DateTime, Utc};

/// Provides the current time.
///
/// Creation and completion stamps, overdue checks and the trailing-month
/// statistics all read the time through this trait so tests can pin it.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::Cell;

    use chrono::{DateTime, Duration, Utc};

    use super::Clock;

    /// Clock that returns a settable instant.
    pub struct FixedClock(Cell<DateTime<Utc>>);

    impl FixedClock {
        pub fn new(at: DateTime<Utc>) -> Self {
            FixedClock(Cell::new(at))
        }

        pub fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    impl Clock for std::rc::Rc<FixedClock> {
        fn now(&self) -> DateTime<Utc> {
            self.as_ref().now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_returns_current_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        let after = Utc::now();
        assert!(now >= before && now <= after);
    }
}
