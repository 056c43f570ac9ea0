use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Sku, UtcDateTime, ValidationError};

/// Identifier for one of the integrated vendor feeds.
///
/// The `Ord` impl follows the lowercase string form and is the
/// tie-break everywhere a selection between equal offers must be
/// deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VendorId {
    /// Warehouse management API.
    Depotline,
    /// Legacy fulfilment system with slow, flaky responses.
    Mercantile,
    /// E-commerce storefront API.
    Shopwave,
}

impl VendorId {
    pub const ALL: [Self; 3] = [Self::Depotline, Self::Mercantile, Self::Shopwave];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Depotline => "depotline",
            Self::Mercantile => "mercantile",
            Self::Shopwave => "shopwave",
        }
    }
}

impl Display for VendorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of a single canonical offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Available,
    OutOfStock,
}

/// Vendor offer after format normalization and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalOffer {
    pub sku: Sku,
    pub vendor: VendorId,
    pub price: f64,
    pub stock: u32,
    pub status: OfferStatus,
    pub observed_at: UtcDateTime,
    /// Whether the offer passed the freshness check. Stale offers are
    /// kept for bookkeeping but never enter selection.
    pub usable: bool,
}

impl CanonicalOffer {
    /// Build a canonical offer. Non-finite or non-positive prices are a
    /// [`ValidationError`]; the normalizer turns those into discards.
    pub fn new(
        sku: Sku,
        vendor: VendorId,
        price: f64,
        stock: u32,
        observed_at: UtcDateTime,
        usable: bool,
    ) -> Result<Self, ValidationError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(ValidationError::InvalidPrice { value: price });
        }

        let status = if stock > 0 {
            OfferStatus::Available
        } else {
            OfferStatus::OutOfStock
        };

        Ok(Self {
            sku,
            vendor,
            price,
            stock,
            status,
            observed_at,
            usable,
        })
    }
}

/// Outcome status for a whole selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionStatus {
    Available,
    OutOfStock,
    /// No vendor produced a usable offer this cycle.
    Unavailable,
}

/// Best-offer decision for one SKU, as returned to callers and cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub sku: Sku,
    pub best_vendor: Option<VendorId>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub status: SelectionStatus,
    /// Vendors that returned any payload this cycle, usable or not.
    pub vendors_checked: u32,
    /// Offers that survived normalization and the freshness check.
    pub vendors_usable: u32,
    pub cache_hit: bool,
    pub computed_at: UtcDateTime,
}
