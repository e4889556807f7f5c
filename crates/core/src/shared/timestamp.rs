use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capture time of a message, relative to an arbitrary shared epoch.
///
/// Serialized as floating-point seconds so that JSON message logs stay
/// readable (`"stamp": 12.034`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_duration(since_epoch: Duration) -> Self {
        Self(since_epoch)
    }

    /// Negative and non-finite inputs collapse to [`Timestamp::ZERO`].
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Absolute distance between two stamps.
    pub fn abs_diff(&self, other: Timestamp) -> Duration {
        if self.0 >= other.0 {
            self.0 - other.0
        } else {
            other.0 - self.0
        }
    }
}

impl TryFrom<f64> for Timestamp {
    type Error = String;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!("timestamp must be a finite, non-negative number of seconds, got {secs}"));
        }
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|e| e.to_string())
    }
}

impl From<Timestamp> for f64 {
    fn from(stamp: Timestamp) -> Self {
        stamp.as_secs_f64()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_from_secs_roundtrips_through_f64() {
        let stamp = Timestamp::from_secs_f64(12.5);
        assert_relative_eq!(stamp.as_secs_f64(), 12.5);
        assert_eq!(stamp.as_duration(), Duration::from_millis(12_500));
    }

    #[rstest]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_from_secs_collapses_invalid_to_zero(#[case] secs: f64) {
        assert_eq!(Timestamp::from_secs_f64(secs), Timestamp::ZERO);
    }

    #[test]
    fn test_abs_diff_is_symmetric() {
        let a = Timestamp::from_duration(Duration::from_millis(10));
        let b = Timestamp::from_duration(Duration::from_millis(35));
        assert_eq!(a.abs_diff(b), Duration::from_millis(25));
        assert_eq!(b.abs_diff(a), Duration::from_millis(25));
        assert_eq!(a.abs_diff(a), Duration::ZERO);
    }

    #[test]
    fn test_ordering_follows_time() {
        let early = Timestamp::from_secs_f64(0.01);
        let late = Timestamp::from_secs_f64(0.02);
        assert!(early < late);
    }

    #[test]
    fn test_json_uses_seconds() {
        let stamp = Timestamp::from_duration(Duration::from_millis(1500));
        assert_eq!(serde_json::to_string(&stamp).unwrap(), "1.5");
        let parsed: Timestamp = serde_json::from_str("0.25").unwrap();
        assert_eq!(parsed.as_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_json_rejects_negative() {
        assert!(serde_json::from_str::<Timestamp>("-3.0").is_err());
    }

    #[test]
    fn test_display_has_microsecond_precision() {
        assert_eq!(Timestamp::from_secs_f64(2.0).to_string(), "2.000000");
    }
}
