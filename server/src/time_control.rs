//! Time controls.
//!
//! A time control is the pair (starting clock, per-move increment). On the
//! wire both are humantime strings ("5m", "1s", "500ms"); queues are keyed
//! by the parsed value, so "300s" and "5m" land players in the same pool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeControl {
    #[serde(with = "duration_string")]
    pub duration: Duration,
    #[serde(with = "duration_string")]
    pub increment: Duration,
}

impl TimeControl {
    pub fn new(duration: Duration, increment: Duration) -> TimeControl {
        TimeControl {
            duration,
            increment,
        }
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}",
            humantime::format_duration(self.duration),
            humantime::format_duration(self.increment)
        )
    }
}

mod duration_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_strings() {
        let tc: TimeControl =
            serde_json::from_str(r#"{"duration": "5m", "increment": "1s"}"#).unwrap();
        assert_eq!(tc.duration, Duration::from_secs(300));
        assert_eq!(tc.increment, Duration::from_secs(1));

        let tc: TimeControl =
            serde_json::from_str(r#"{"duration": "500ms", "increment": "0s"}"#).unwrap();
        assert_eq!(tc.duration, Duration::from_millis(500));
        assert_eq!(tc.increment, Duration::ZERO);
    }

    #[test]
    fn rejects_junk() {
        assert!(serde_json::from_str::<TimeControl>(r#"{"duration": "fast", "increment": "1s"}"#)
            .is_err());
        assert!(serde_json::from_str::<TimeControl>(r#"{"duration": "5m"}"#).is_err());
    }

    #[test]
    fn equal_controls_share_a_queue_key() {
        let a: TimeControl =
            serde_json::from_str(r#"{"duration": "5m", "increment": "0s"}"#).unwrap();
        let b: TimeControl =
            serde_json::from_str(r#"{"duration": "300s", "increment": "0s"}"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn renders_round_trip() {
        let tc = TimeControl::new(Duration::from_secs(600), Duration::from_secs(2));
        let json = serde_json::to_string(&tc).unwrap();
        let back: TimeControl = serde_json::from_str(&json).unwrap();
        assert_eq!(tc, back);
    }
}
