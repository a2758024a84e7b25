use chrono::{DateTime, Utc};
use std::time::Duration;

/// A closed counting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowReport {
    pub count: u64,
    pub window_start: DateTime<Utc>,
    /// Arrival time of the record that closed the window
    pub window_end: DateTime<Utc>,
}

impl WindowReport {
    /// Wall-clock span actually covered, which exceeds the configured
    /// duration when the window closed late after a quiet period.
    pub fn span(&self) -> Duration {
        (self.window_end - self.window_start)
            .to_std()
            .unwrap_or_default()
    }
}

/// Arrival-driven fixed-duration window.
///
/// Expiry is only checked when a record arrives, so a window with no traffic
/// stays open until the next arrival and then closes covering the idle span.
#[derive(Debug, Clone)]
pub struct WindowState {
    window_start: DateTime<Utc>,
    window_duration: Duration,
    count: u64,
}

impl WindowState {
    pub fn new(window_start: DateTime<Utc>, window_duration: Duration) -> Self {
        Self {
            window_start,
            window_duration,
            count: 0,
        }
    }

    /// Count one arrival at `now`.
    /// Returns a report if this arrival reaches or passes the window boundary.
    pub fn record_arrival(&mut self, now: DateTime<Utc>) -> Option<WindowReport> {
        self.count += 1;

        // A clock stepping backwards never closes the window
        let elapsed = (now - self.window_start).to_std().unwrap_or_default();
        if elapsed < self.window_duration {
            return None;
        }

        let report = WindowReport {
            count: self.count,
            window_start: self.window_start,
            window_end: now,
        };
        self.window_start = now;
        self.count = 0;
        Some(report)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn window() -> WindowState {
        WindowState::new(at(0), Duration::from_secs(60))
    }

    #[test]
    fn test_counts_within_window() {
        let mut state = window();
        assert!(state.record_arrival(at(1)).is_none());
        assert!(state.record_arrival(at(30)).is_none());
        assert!(state.record_arrival(at(59)).is_none());
        assert_eq!(state.count(), 3);
        assert_eq!(state.window_start(), at(0));
    }

    #[test]
    fn test_boundary_arrival_closes_window() {
        let mut state = window();
        state.record_arrival(at(10));
        state.record_arrival(at(20));

        let report = state.record_arrival(at(60)).unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.window_start, at(0));
        assert_eq!(report.window_end, at(60));

        assert_eq!(state.count(), 0);
        assert_eq!(state.window_start(), at(60));
    }

    #[test]
    fn test_next_window_starts_at_previous_end() {
        let mut state = window();
        let first = state.record_arrival(at(61)).unwrap();
        assert!(state.record_arrival(at(100)).is_none());
        let second = state.record_arrival(at(121)).unwrap();

        assert_eq!(second.window_start, first.window_end);
        assert_eq!(second.count, 2);
    }

    #[test]
    fn test_idle_period_closes_late() {
        let mut state = window();
        assert!(state.record_arrival(at(0)).is_none());

        let report = state.record_arrival(at(90)).unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.window_start, at(0));
        assert_eq!(report.window_end, at(90));
        assert_eq!(report.span(), Duration::from_secs(90));
        assert_eq!(state.window_start(), at(90));
    }

    #[test]
    fn test_clock_going_backwards() {
        let mut state = WindowState::new(at(100), Duration::from_secs(60));
        assert!(state.record_arrival(at(50)).is_none());
        assert_eq!(state.count(), 1);
    }
}
