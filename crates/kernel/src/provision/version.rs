//! Dot-separated numeric data versions.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error parsing a data version string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,

    #[error("invalid version segment '{segment}' in '{raw}'")]
    InvalidSegment { raw: String, segment: String },
}

/// A dot-separated tuple of non-negative integers, e.g. `1.2.0`.
///
/// Ordering is segment-wise numeric, never lexical: `1.10.0` sorts after
/// `1.9.0`. A missing trailing segment sorts before a present one, so
/// `1.2` < `1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataVersion(Vec<u64>);

impl DataVersion {
    pub fn segments(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for DataVersion {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self, VersionError> {
        if raw.trim().is_empty() {
            return Err(VersionError::Empty);
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let n = part
                .trim()
                .parse::<u64>()
                .map_err(|_| VersionError::InvalidSegment {
                    raw: raw.to_string(),
                    segment: part.to_string(),
                })?;
            segments.push(n);
        }

        Ok(Self(segments))
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for DataVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn v(raw: &str) -> DataVersion {
        raw.parse().unwrap()
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!(v("1.2.0").to_string(), "1.2.0");
        assert_eq!(v("0").segments(), &[0]);
        assert_eq!(v("10.0.3").segments(), &[10, 0, 3]);
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("1.2") < v("1.2.0"));
        assert_eq!(v("1.2.0"), v("1.2.0"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("".parse::<DataVersion>(), Err(VersionError::Empty));
        assert!(matches!(
            "1.x.0".parse::<DataVersion>(),
            Err(VersionError::InvalidSegment { .. })
        ));
        assert!(matches!(
            "1..0".parse::<DataVersion>(),
            Err(VersionError::InvalidSegment { .. })
        ));
        assert!("-1.0".parse::<DataVersion>().is_err());
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let version = v("1.2.0");
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"1.2.0\"");
        let back: DataVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);
    }
}
