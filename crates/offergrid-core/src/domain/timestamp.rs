use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{format_description, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::ValidationError;

const LEGACY_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// RFC3339 timestamp guaranteed to be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parse an RFC3339 timestamp. Offsets other than UTC are rejected.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        Self::from_offset_datetime(parsed.to_offset(UtcOffset::UTC))
    }

    /// Parse a unix timestamp in whole seconds.
    pub fn from_unix_seconds(value: i64) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::from_unix_timestamp(value)
            .map_err(|_| ValidationError::TimestampOutOfRange { value })?;
        Self::from_offset_datetime(parsed)
    }

    /// Parse the legacy `YYYY-MM-DD HH:MM:SS` wall-clock format, assumed UTC.
    pub fn parse_legacy(input: &str) -> Result<Self, ValidationError> {
        let format = format_description::parse(LEGACY_FORMAT)
            .expect("legacy format description is well-formed");
        let parsed =
            PrimitiveDateTime::parse(input, &format).map_err(|_| ValidationError::TimestampFormat {
                value: input.to_owned(),
                format: "YYYY-MM-DD HH:MM:SS",
            })?;
        Ok(Self(parsed.assume_utc()))
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Result<Self, ValidationError> {
        if value.offset() != UtcOffset::UTC {
            return Err(ValidationError::TimestampNotUtc {
                value: value
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| String::from("<unformattable>")),
            });
        }

        Ok(Self(value))
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    /// Elapsed time between this instant and a later one. Negative spans
    /// (timestamps from the future) clamp to zero.
    pub fn age_at(self, now: Self) -> std::time::Duration {
        let span = now.0 - self.0;
        span.try_into().unwrap_or(std::time::Duration::ZERO)
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("UtcDateTime must be RFC3339 formattable")
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
