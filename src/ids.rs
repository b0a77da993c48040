//! Bounded fixed-length identifier newtypes (spec §3: all identifiers are
//! bounded fixed-length strings).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! bounded_string {
    ($name:ident, $max_len:expr, $what:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub const MAX_LEN: usize = $max_len;

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                if value.is_empty() || value.chars().count() > $max_len {
                    return Err(CoreError::Arg(concat!($what, " has invalid length")));
                }
                Ok(Self(value.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::try_from(value.as_str())
            }
        }
    };
}

bounded_string!(UserId, 20, "user id");
bounded_string!(TrainId, 20, "train id");
bounded_string!(StationName, 30, "station name");
bounded_string!(Password, 30, "password");
bounded_string!(DisplayName, 5, "display name");
bounded_string!(MailAddr, 30, "mail address");

impl StationName {
    /// The lowest key for a `(station, tid)` range scan: `(s, "")`.
    pub fn range_floor(&self) -> (StationName, TrainId) {
        (self.clone(), TrainId(String::new()))
    }

    /// The highest key for a `(station, tid)` range scan: `(s, INF_TID)`.
    /// `TrainId` doesn't validate this sentinel through `TryFrom` since it
    /// is longer than `TrainId::MAX_LEN` by design: it must sort after
    /// every real train id.
    pub fn range_ceiling(&self) -> (StationName, TrainId) {
        (self.clone(), TrainId("\u{10FFFF}".repeat(TrainId::MAX_LEN + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlong_ids() {
        let too_long = "a".repeat(21);
        assert!(UserId::try_from(too_long.as_str()).is_err());
    }

    #[test]
    fn rejects_empty_ids() {
        assert!(UserId::try_from("").is_err());
    }

    #[test]
    fn accepts_boundary_length() {
        let exact = "a".repeat(20);
        assert!(UserId::try_from(exact.as_str()).is_ok());
    }

    #[test]
    fn station_range_bounds_are_ordered() {
        let s = StationName::try_from("Paris").unwrap();
        let (lo_sta, lo_tid) = s.range_floor();
        let (hi_sta, hi_tid) = s.range_ceiling();
        assert_eq!(lo_sta, hi_sta);
        assert!(lo_tid < hi_tid);
    }
}
