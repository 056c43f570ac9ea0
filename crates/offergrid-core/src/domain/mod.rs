//! Canonical domain types for the aggregation pipeline.
//!
//! All types validate their invariants at construction time: a [`Sku`]
//! outside 3-20 alphanumerics, a non-UTC timestamp, or a non-positive
//! price is unrepresentable past this module.

mod models;
mod sku;
mod timestamp;

pub use models::{
    CanonicalOffer, OfferStatus, SelectionResult, SelectionStatus, VendorId,
};
pub use sku::Sku;
pub use timestamp::UtcDateTime;
