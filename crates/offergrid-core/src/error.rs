use thiserror::Error;

/// Validation and contract errors exposed by `offergrid-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("sku cannot be empty")]
    EmptySku,
    #[error("sku length {len} must be between {min} and {max} characters")]
    SkuLengthOutOfRange { len: usize, min: usize, max: usize },
    #[error("sku contains invalid character '{ch}' at index {index}")]
    SkuInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp '{value}' does not match '{format}'")]
    TimestampFormat {
        value: String,
        format: &'static str,
    },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("offer price {value} must be finite and greater than zero")]
    InvalidPrice { value: f64 },
}

/// Failure of the shared key-value store behind the cache.
///
/// Always recoverable: the pipeline falls back to direct computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("selection store unavailable: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
