//! Blocking wait-until-condition primitive
//!
//! Polls a condition, sleeping a fixed interval between polls. The
//! condition is checked before the first sleep, so a condition that already
//! holds returns after one poll without sleeping.

use embedded_hal::delay::DelayNs;

/// How long a wait may last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Poll until the condition holds, however long that takes
    #[default]
    Never,
    /// Give up once this much polling time has elapsed
    AfterMs(u32),
}

/// Poll interval and timeout of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitPolicy {
    /// Sleep between polls
    pub poll_interval_ms: u32,
    pub timeout: Timeout,
}

impl WaitPolicy {
    /// Poll every `poll_interval_ms` forever
    pub const fn unbounded(poll_interval_ms: u32) -> Self {
        Self {
            poll_interval_ms,
            timeout: Timeout::Never,
        }
    }

    /// Poll every `poll_interval_ms` for at most `timeout_ms`
    pub const fn bounded(poll_interval_ms: u32, timeout_ms: u32) -> Self {
        Self {
            poll_interval_ms,
            timeout: Timeout::AfterMs(timeout_ms),
        }
    }

    /// Maximum number of sleeps before giving up, `None` if unbounded
    ///
    /// A timeout that is not a multiple of the interval rounds up, so the
    /// wait never gives up before the timeout has elapsed.
    pub fn max_sleeps(&self) -> Option<u32> {
        match self.timeout {
            Timeout::Never => None,
            Timeout::AfterMs(ms) => {
                let interval = self.poll_interval_ms.max(1);
                Some(ms.div_ceil(interval))
            }
        }
    }
}

/// Why a wait ended without the condition holding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitError<E> {
    /// The timeout elapsed after this many polls
    TimedOut { polls: u32 },
    /// Evaluating the condition failed
    Condition(E),
}

/// Block until `condition` returns `Ok(true)`
///
/// Returns the number of polls it took, counting the successful one. An
/// error from the condition ends the wait immediately.
pub fn wait_until<D, E, F>(
    delay: &mut D,
    policy: &WaitPolicy,
    mut condition: F,
) -> Result<u32, WaitError<E>>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, E>,
{
    let max_sleeps = policy.max_sleeps();
    let mut polls: u32 = 0;

    loop {
        polls = polls.saturating_add(1);
        if condition().map_err(WaitError::Condition)? {
            return Ok(polls);
        }

        // polls - 1 sleeps have happened so far
        if let Some(max) = max_sleeps {
            if polls > max {
                return Err(WaitError::TimedOut { polls });
            }
        }

        delay.delay_ms(policy.poll_interval_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingDelay;
    use proptest::prelude::*;

    #[test]
    fn test_condition_already_true() {
        let mut delay = CountingDelay::new();
        let polls = wait_until::<_, (), _>(&mut delay, &WaitPolicy::unbounded(10), || Ok(true));
        assert_eq!(polls, Ok(1));
        assert_eq!(delay.elapsed_ms(), 0);
    }

    #[test]
    fn test_sleeps_between_polls() {
        let mut delay = CountingDelay::new();
        let mut remaining = 3;
        let polls = wait_until::<_, (), _>(&mut delay, &WaitPolicy::unbounded(10), || {
            if remaining == 0 {
                Ok(true)
            } else {
                remaining -= 1;
                Ok(false)
            }
        });
        assert_eq!(polls, Ok(4));
        assert_eq!(delay.elapsed_ms(), 30);
    }

    #[test]
    fn test_timeout() {
        let mut delay = CountingDelay::new();
        let result = wait_until::<_, (), _>(&mut delay, &WaitPolicy::bounded(10, 50), || Ok(false));
        // Polls at t = 0, 10, 20, 30, 40, 50
        assert_eq!(result, Err(WaitError::TimedOut { polls: 6 }));
        assert_eq!(delay.elapsed_ms(), 50);
    }

    #[test]
    fn test_timeout_rounds_up() {
        let policy = WaitPolicy::bounded(10, 25);
        assert_eq!(policy.max_sleeps(), Some(3));
        assert_eq!(WaitPolicy::unbounded(10).max_sleeps(), None);
    }

    #[test]
    fn test_condition_error_stops_wait() {
        let mut delay = CountingDelay::new();
        let mut calls = 0;
        let result = wait_until(&mut delay, &WaitPolicy::unbounded(10), || {
            calls += 1;
            if calls == 2 {
                Err("sensor unplugged")
            } else {
                Ok(false)
            }
        });
        assert_eq!(result, Err(WaitError::Condition("sensor unplugged")));
        assert_eq!(delay.elapsed_ms(), 10);
    }

    #[test]
    fn test_zero_timeout_polls_once() {
        let mut delay = CountingDelay::new();
        let result = wait_until::<_, (), _>(&mut delay, &WaitPolicy::bounded(10, 0), || Ok(false));
        assert_eq!(result, Err(WaitError::TimedOut { polls: 1 }));
        assert_eq!(delay.elapsed_ms(), 0);
    }

    proptest! {
        #[test]
        fn prop_exits_on_first_reading_over_threshold(
            readings in proptest::collection::vec(0u8..=100, 1..40),
            threshold in 0u8..=100,
        ) {
            let mut delay = CountingDelay::new();
            let mut index = 0usize;
            let policy = WaitPolicy::bounded(10, 10 * readings.len() as u32);
            let result = wait_until::<_, (), _>(&mut delay, &policy, || {
                let value = readings[index.min(readings.len() - 1)];
                index += 1;
                Ok(value >= threshold)
            });

            match readings.iter().position(|&r| r >= threshold) {
                Some(first) => {
                    prop_assert_eq!(result, Ok(first as u32 + 1));
                    prop_assert_eq!(delay.elapsed_ms(), 10 * first as u64);
                }
                None => {
                    prop_assert!(matches!(result, Err(WaitError::TimedOut { .. })));
                }
            }
        }
    }
}
