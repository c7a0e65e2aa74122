//! Same-candidate retry policy.
//!
//! Fallback already moves past a candidate that refuses to open a stream.
//! A [`BackoffConfig`] with retries lets a candidate that answered 429 or
//! 503 try again after a pause first. The default performs no retries.

use std::time::Duration;

/// Retry policy applied to each model candidate before falling back.
///
/// # Example
///
/// ```
/// use blogflow::backend::BackoffConfig;
///
/// assert_eq!(BackoffConfig::none().max_retries, 0);
/// assert_eq!(BackoffConfig::interactive().max_retries, 2);
/// ```
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    /// Ceiling for every delay, including `Retry-After` hints.
    pub max_delay: Duration,
    pub jitter: JitterStrategy,
    /// Statuses worth another attempt on the same candidate.
    pub retryable_statuses: Vec<u16>,
    /// Wait for the provider's `Retry-After` instead of the computed delay.
    pub respect_retry_after: bool,
}

/// Randomization applied to a computed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterStrategy {
    None,
    /// Anywhere in `[0, delay]`.
    Full,
    /// Anywhere in `[delay / 2, delay]`.
    Equal,
}

impl JitterStrategy {
    fn apply(self, secs: f64) -> f64 {
        match self {
            JitterStrategy::None => secs,
            JitterStrategy::Full => secs * fastrand::f64(),
            JitterStrategy::Equal => secs * (0.5 + 0.5 * fastrand::f64()),
        }
    }
}

impl BackoffConfig {
    /// Exactly one attempt per candidate.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::interactive()
        }
    }

    /// Tuned for someone watching the editor fill: two quick retries on
    /// quota and overload responses, never waiting more than four seconds.
    pub fn interactive() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(750),
            multiplier: 2.0,
            max_delay: Duration::from_secs(4),
            jitter: JitterStrategy::Equal,
            retryable_statuses: vec![429, 500, 503, 504],
            respect_retry_after: true,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt`, counting from zero.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let growth = self.multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let secs = (self.initial_delay.as_secs_f64() * growth).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(self.jitter.apply(secs).max(0.0))
    }

    pub(crate) fn delay_after(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) if self.respect_retry_after => hint.min(self.max_delay),
            _ => self.delay_for_attempt(attempt),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deterministic(cap_secs: u64) -> BackoffConfig {
        BackoffConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(cap_secs),
            jitter: JitterStrategy::None,
            ..BackoffConfig::interactive()
        }
    }

    #[test]
    fn test_doubling_until_cap() {
        let config = deterministic(6);
        let delays: Vec<u64> = (0..5)
            .map(|n| config.delay_for_attempt(n).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 6, 6]);
    }

    #[test]
    fn test_equal_jitter_keeps_lower_half() {
        let config = BackoffConfig {
            jitter: JitterStrategy::Equal,
            ..deterministic(60)
        };
        for _ in 0..50 {
            let d = config.delay_for_attempt(2);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(4));
        }
    }

    #[test]
    fn test_retry_after_hint_capped() {
        let config = deterministic(4);
        assert_eq!(
            config.delay_after(0, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
        assert_eq!(
            config.delay_after(0, Some(Duration::from_secs(90))),
            Duration::from_secs(4)
        );

        let ignoring = BackoffConfig {
            respect_retry_after: false,
            ..deterministic(4)
        };
        assert_eq!(
            ignoring.delay_after(1, Some(Duration::from_secs(3))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_default_never_retries() {
        assert_eq!(BackoffConfig::default().max_retries, 0);
        assert_eq!(BackoffConfig::none().with_max_retries(1).max_retries, 1);
    }
}
