use std::thread::sleep;
use std::time::{Duration, Instant};

/// Run `predicate` every `interval` until it returns true or the total
/// `max_wait` budget elapses. Returns whether the predicate ever succeeded.
///
/// The predicate is always tried at least once, even with a zero budget.
pub fn poll_until<F>(interval: Duration, max_wait: Duration, mut predicate: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if predicate() {
            return true;
        }
        if start.elapsed() >= max_wait {
            return false;
        }
        sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_success_does_not_sleep() {
        let start = Instant::now();
        assert!(poll_until(
            Duration::from_secs(10),
            Duration::from_secs(10),
            || true
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn predicate_runs_at_least_once_with_zero_budget() {
        let mut calls = 0;
        let succeeded = poll_until(Duration::from_millis(1), Duration::ZERO, || {
            calls += 1;
            false
        });
        assert!(!succeeded);
        assert_eq!(calls, 1);
    }

    #[test]
    fn eventually_true_within_budget() {
        let mut calls = 0;
        let succeeded = poll_until(Duration::from_millis(5), Duration::from_secs(5), || {
            calls += 1;
            calls == 3
        });
        assert!(succeeded);
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_budget() {
        let succeeded = poll_until(
            Duration::from_millis(5),
            Duration::from_millis(20),
            || false,
        );
        assert!(!succeeded);
    }
}
