//! HTTP service wrapping the offergrid aggregation engine.

pub mod api;
pub mod error;

pub use api::{router, AppState, ANONYMOUS_CALLER};
pub use error::{ApiError, ApiErrorResponse};
