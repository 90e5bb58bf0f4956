//! Unix-second timestamps transported as stringified integers.
//!
//! `validAfter`/`validBefore` are carried on the wire as decimal strings, not
//! JSON numbers, to avoid precision loss in JavaScript consumers. This type
//! keeps that quirk at the boundary instead of leaking `String` everywhere a
//! timestamp is used internally.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Add;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn saturating_sub(self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = UnixTimestamp;

    fn add(self, rhs: u64) -> UnixTimestamp {
        UnixTimestamp(self.0 + rhs)
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u64>().map(UnixTimestamp).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_a_json_string() {
        let ts = UnixTimestamp::from_secs(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1700000000\"");
    }

    #[test]
    fn round_trips_through_json() {
        let ts = UnixTimestamp::from_secs(42);
        let json = serde_json::to_string(&ts).unwrap();
        let back: UnixTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }

    #[test]
    fn arithmetic_helpers() {
        let now = UnixTimestamp::from_secs(1000);
        assert_eq!((now + 60).as_secs(), 1060);
        assert_eq!(now.saturating_sub(60).as_secs(), 940);
        assert_eq!(UnixTimestamp::from_secs(10).saturating_sub(60).as_secs(), 0);
    }
}
