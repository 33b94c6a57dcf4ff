use std::time::{Duration, Instant};

/// Default display refresh interval in milliseconds
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Get tick duration, falling back to the default for a zero interval
pub fn tick_duration(tick_ms: u64) -> Duration {
    if tick_ms == 0 {
        Duration::from_millis(DEFAULT_TICK_MS)
    } else {
        Duration::from_millis(tick_ms)
    }
}

/// Periodic refresh schedule owned by a view; cancelled when the view closes
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last: Option<Instant>,
    cancelled: bool,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            cancelled: false,
        }
    }

    /// Whether a refresh is due. The first check is always due.
    pub fn is_due(&self, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Record that a refresh happened at `now`
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// Time left until the next refresh, for use as an input poll timeout
    pub fn until_due(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) if !self.cancelled => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            Some(_) => self.interval,
            None => Duration::ZERO,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration() {
        assert_eq!(tick_duration(1000), Duration::from_secs(1));
        assert_eq!(tick_duration(250), Duration::from_millis(250));
        assert_eq!(tick_duration(0), Duration::from_secs(1));
    }

    #[test]
    fn test_ticker_due_once_per_interval() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(1));
        assert!(ticker.is_due(start));

        ticker.mark(start);
        assert!(!ticker.is_due(start + Duration::from_millis(999)));
        assert!(ticker.is_due(start + Duration::from_secs(1)));
        assert_eq!(
            ticker.until_due(start + Duration::from_millis(400)),
            Duration::from_millis(600)
        );
    }

    #[test]
    fn test_cancelled_ticker_never_due() {
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.mark(start);
        ticker.cancel();

        assert!(!ticker.is_due(start + Duration::from_secs(10)));
    }
}
