//! Fixed pacing delays imposed by the host's free tier.
//!
//! The waits are a hard requirement of the flow (anti-abuse throttling), not
//! an optimization. [`Pacer`] makes them injectable so tests run the state
//! machine without wall-clock waits.

use std::time::Duration;

/// A fixed, mandatory delay applied before a rate-sensitive step.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
    disabled: bool,
}

impl Pacer {
    /// Creates a pacer that waits `delay` on every [`Pacer::wait`] call.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            disabled: false,
        }
    }

    /// Creates a pacer that never waits (tests).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            delay: Duration::ZERO,
            disabled: true,
        }
    }

    /// The configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether this pacer is a no-op.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Sleeps for the configured delay, or returns immediately when disabled.
    pub async fn wait(&self) {
        if self.disabled || self.delay.is_zero() {
            return;
        }
        tokio::time::sleep(self.delay).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_reports_configuration() {
        let pacer = Pacer::new(Duration::from_secs(6));
        assert_eq!(pacer.delay(), Duration::from_secs(6));
        assert!(!pacer.is_disabled());

        let disabled = Pacer::disabled();
        assert!(disabled.is_disabled());
        assert_eq!(disabled.delay(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_waits_configured_delay() {
        let pacer = Pacer::new(Duration::from_secs(6));
        let before = tokio::time::Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_pacer_returns_immediately() {
        let pacer = Pacer::disabled();
        let before = tokio::time::Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
