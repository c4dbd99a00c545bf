//! Instant provider for range resolution and the follow loop's waits.
//!
//! Every relative time bound is resolved against `Clock::now()` at the
//! moment a query is issued, never memoized.

use crate::cancel::CancelToken;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Longest uninterrupted sleep slice while waiting between cycles.
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);

    /// Sleep for `duration` in slices, returning early once `cancel` fires.
    ///
    /// Returns `true` if the full duration elapsed without cancellation.
    fn sleep_unless_cancelled(&self, duration: Duration, cancel: &CancelToken) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if cancel.is_cancelled() {
                return false;
            }
            let slice = remaining.min(SLEEP_SLICE);
            self.sleep(slice);
            remaining -= slice;
        }
        !cancel.is_cancelled()
    }
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct CountingClock {
        slept: RefCell<Vec<Duration>>,
        cancel_after: Cell<Option<(usize, CancelToken)>>,
    }

    impl Clock for CountingClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::<Utc>::UNIX_EPOCH
        }

        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
            if let Some((n, token)) = self.cancel_after.take() {
                if self.slept.borrow().len() >= n {
                    token.cancel();
                } else {
                    self.cancel_after.set(Some((n, token)));
                }
            }
        }
    }

    #[test]
    fn test_sleep_is_sliced() {
        let clock = CountingClock {
            slept: RefCell::new(Vec::new()),
            cancel_after: Cell::new(None),
        };
        let token = CancelToken::new();

        assert!(clock.sleep_unless_cancelled(Duration::from_millis(250), &token));
        assert_eq!(
            *clock.slept.borrow(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(50)
            ]
        );
    }

    #[test]
    fn test_sleep_stops_on_cancel() {
        let token = CancelToken::new();
        let clock = CountingClock {
            slept: RefCell::new(Vec::new()),
            cancel_after: Cell::new(Some((2, token.clone()))),
        };

        assert!(!clock.sleep_unless_cancelled(Duration::from_secs(5), &token));
        assert_eq!(clock.slept.borrow().len(), 2);
    }

    #[test]
    fn test_zero_sleep_reports_cancel_state() {
        let clock = SystemClock;
        let token = CancelToken::new();
        assert!(clock.sleep_unless_cancelled(Duration::ZERO, &token));
        token.cancel();
        assert!(!clock.sleep_unless_cancelled(Duration::ZERO, &token));
    }
}
