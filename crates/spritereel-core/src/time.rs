use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Time duration with sub-millisecond precision (stored as fractional seconds).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration {
    /// Duration in seconds.
    seconds: f64,
}

impl Duration {
    /// Create a duration from seconds. Negative input clamps to zero.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: s.max(0.0),
        }
    }

    /// Create a duration from milliseconds.
    pub fn from_millis(ms: f64) -> Self {
        Self::from_seconds(ms / 1000.0)
    }

    /// Create a zero duration.
    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get duration as seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Get duration as milliseconds.
    pub fn as_millis(&self) -> f64 {
        self.seconds * 1000.0
    }

    /// Whole elapsed seconds, truncated.
    pub fn whole_seconds(&self) -> u64 {
        self.seconds.floor() as u64
    }

    /// Compute number of frames for a given FPS.
    pub fn frame_count(&self, fps: f64) -> u64 {
        (self.seconds * fps).ceil() as u64
    }

    /// Elapsed-time label in `mm:ss` form, as shown next to the record button.
    /// Minutes keep growing past 99.
    pub fn clock_label(&self) -> String {
        let total = self.whole_seconds();
        format!("{:02}:{:02}", total / 60, total % 60)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds + rhs.seconds)
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration::from_seconds(self.seconds - rhs.seconds)
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Duration::from_seconds(value.as_secs_f64())
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds < 1.0 {
            write!(f, "{:.0}ms", self.seconds * 1000.0)
        } else {
            write!(f, "{:.2}s", self.seconds)
        }
    }
}

/// A monotonic point in time, measured from an arbitrary clock origin.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    /// Create a timestamp from seconds.
    pub fn from_seconds(s: f64) -> Self {
        Self {
            seconds: s.max(0.0),
        }
    }

    /// The clock origin.
    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get the time in seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Time elapsed since `earlier`; zero if `earlier` is in the future.
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_seconds(self.seconds - earlier.seconds)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::zero()
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::from_seconds(self.seconds + rhs.as_seconds())
    }
}

impl Sub for Timestamp {
    type Output = Duration;
    fn sub(self, rhs: Timestamp) -> Duration {
        self.duration_since(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_seconds() {
        let d = Duration::from_seconds(2.5);
        assert!((d.as_seconds() - 2.5).abs() < 0.001);
        assert!((d.as_millis() - 2500.0).abs() < 0.1);
        assert_eq!(Duration::from_seconds(-3.0), Duration::zero());
    }

    #[test]
    fn test_duration_frame_count() {
        let d = Duration::from_seconds(1.0);
        assert_eq!(d.frame_count(60.0), 60);
    }

    #[test]
    fn test_clock_label() {
        assert_eq!(Duration::zero().clock_label(), "00:00");
        assert_eq!(Duration::from_seconds(59.999).clock_label(), "00:59");
        assert_eq!(Duration::from_seconds(65.0).clock_label(), "01:05");
        assert_eq!(Duration::from_seconds(6000.0).clock_label(), "100:00");
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(format!("{}", Duration::from_seconds(2.5)), "2.50s");
        assert_eq!(format!("{}", Duration::from_millis(500.0)), "500ms");
    }

    #[test]
    fn test_timestamp_difference() {
        let start = Timestamp::from_seconds(10.0);
        let now = start + Duration::from_seconds(65.0);
        assert!(((now - start).as_seconds() - 65.0).abs() < 1e-9);
        assert_eq!(start - now, Duration::zero());
    }

    #[test]
    fn test_from_std_duration() {
        let d: Duration = std::time::Duration::from_millis(1500).into();
        assert!((d.as_seconds() - 1.5).abs() < 1e-9);
    }
}
