//! Vendor client contract and raw payload schemas.
//!
//! Each integrated vendor speaks its own wire format; one
//! [`RawVendorOffer`] variant per schema keeps the shapes apart until
//! the normalizer converges them on [`CanonicalOffer`].
//!
//! | Vendor | Schema | Price field | Timestamp |
//! |--------|--------|-------------|-----------|
//! | shopwave | [`ShopwavePayload`] | `unit_price: f64` | RFC3339 string |
//! | depotline | [`DepotlinePayload`] | `cost_per_unit: "$18.50"` | unix seconds |
//! | mercantile | [`MercantilePayload`] | `price_amount: Option<f64>` | `YYYY-MM-DD HH:MM:SS` |
//!
//! [`CanonicalOffer`]: crate::CanonicalOffer

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Sku, VendorId};

/// Classification of a failed vendor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorErrorKind {
    /// Attempt exceeded the per-attempt timeout.
    Timeout,
    /// Transport-level failure (connect, non-2xx status).
    Transport,
    /// Response arrived but could not be decoded as the vendor schema.
    MalformedPayload,
    /// Rejected without an attempt because the circuit is open.
    CircuitOpen,
}

/// Structured vendor call failure. Never fatal for the aggregation:
/// the pipeline proceeds with one fewer offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorError {
    vendor: VendorId,
    kind: VendorErrorKind,
    message: String,
}

impl VendorError {
    pub fn timeout(vendor: VendorId, message: impl Into<String>) -> Self {
        Self {
            vendor,
            kind: VendorErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn transport(vendor: VendorId, message: impl Into<String>) -> Self {
        Self {
            vendor,
            kind: VendorErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn malformed_payload(vendor: VendorId, message: impl Into<String>) -> Self {
        Self {
            vendor,
            kind: VendorErrorKind::MalformedPayload,
            message: message.into(),
        }
    }

    pub fn circuit_open(vendor: VendorId) -> Self {
        Self {
            vendor,
            kind: VendorErrorKind::CircuitOpen,
            message: format!("circuit for vendor '{}' is open; call rejected", vendor),
        }
    }

    pub const fn vendor(&self) -> VendorId {
        self.vendor
    }

    pub const fn kind(&self) -> VendorErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for VendorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.vendor, self.message)
    }
}

impl std::error::Error for VendorError {}

/// Shopwave e-commerce response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopwavePayload {
    pub product_id: String,
    /// "IN_STOCK" or "OUT_OF_STOCK".
    pub availability: String,
    pub inventory_count: Option<i64>,
    pub unit_price: f64,
    /// RFC3339 timestamp.
    pub last_updated: String,
}

/// Depotline warehouse response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotlinePayload {
    pub sku: String,
    /// "AVAILABLE" or "UNAVAILABLE".
    pub stock_status: String,
    pub quantity_on_hand: i64,
    /// Dollar-prefixed string, e.g. "$18.50".
    pub cost_per_unit: String,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Mercantile legacy response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MercantilePayload {
    pub item_code: String,
    /// "ACTIVE" or "INACTIVE".
    pub status: String,
    /// Numeric string, "LOW", "HIGH", or absent.
    pub stock_level: Option<String>,
    pub price_amount: Option<f64>,
    /// `YYYY-MM-DD HH:MM:SS`, UTC wall clock.
    pub data_timestamp: String,
}

/// Unparsed vendor response, tagged by schema. Discarded after
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawVendorOffer {
    Shopwave(ShopwavePayload),
    Depotline(DepotlinePayload),
    Mercantile(MercantilePayload),
}

impl RawVendorOffer {
    pub const fn vendor(&self) -> VendorId {
        match self {
            Self::Shopwave(_) => VendorId::Shopwave,
            Self::Depotline(_) => VendorId::Depotline,
            Self::Mercantile(_) => VendorId::Mercantile,
        }
    }
}

/// Vendor client contract: one capability, fetch the raw offer for a SKU.
///
/// Implementations must be `Send + Sync`; one request fans out to all
/// registered clients concurrently.
pub trait VendorClient: Send + Sync {
    /// Returns the vendor this client talks to.
    fn id(&self) -> VendorId;

    /// Fetches the raw offer for a SKU.
    ///
    /// # Errors
    ///
    /// Returns [`VendorError`] on transport failure or an undecodable
    /// payload. Timeouts are enforced by the retrying caller, not here.
    fn fetch<'a>(
        &'a self,
        sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>>;
}
