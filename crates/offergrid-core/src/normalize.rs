//! Converts raw vendor payloads into canonical offers.
//!
//! One normalization path per vendor schema, converging on
//! [`CanonicalOffer`]. Steps, in order: parse the vendor-specific
//! timestamp, apply the stock rule, validate the price, and mark
//! freshness. A bad price or timestamp is a rejection, not an error.

use std::time::Duration;

use crate::vendor::{DepotlinePayload, MercantilePayload, RawVendorOffer, ShopwavePayload};
use crate::{CanonicalOffer, Sku, UtcDateTime, VendorId};

/// Default freshness window for vendor offers.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(600);

/// Why a responded payload did not become a canonical offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Price missing, unparsable, non-finite, or not greater than zero.
    InvalidPrice,
    /// Timestamp could not be parsed in the vendor's format.
    BadTimestamp,
    /// Vendor echoed back a SKU that fails validation.
    BadSku,
}

/// Normalization outcome. Discards still count toward
/// `vendors_checked`; they just never reach the selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Offer(CanonicalOffer),
    Discarded { vendor: VendorId, reason: DiscardReason },
}

impl Normalized {
    pub fn offer(&self) -> Option<&CanonicalOffer> {
        match self {
            Self::Offer(offer) => Some(offer),
            Self::Discarded { .. } => None,
        }
    }
}

/// Normalize one raw vendor payload observed at `now`.
pub fn normalize(raw: &RawVendorOffer, now: UtcDateTime, freshness: Duration) -> Normalized {
    match raw {
        RawVendorOffer::Shopwave(payload) => normalize_shopwave(payload, now, freshness),
        RawVendorOffer::Depotline(payload) => normalize_depotline(payload, now, freshness),
        RawVendorOffer::Mercantile(payload) => normalize_mercantile(payload, now, freshness),
    }
}

fn normalize_shopwave(
    payload: &ShopwavePayload,
    now: UtcDateTime,
    freshness: Duration,
) -> Normalized {
    let vendor = VendorId::Shopwave;
    let Ok(observed_at) = UtcDateTime::parse(&payload.last_updated) else {
        return Normalized::Discarded {
            vendor,
            reason: DiscardReason::BadTimestamp,
        };
    };

    // Stock rule: a missing inventory count on an IN_STOCK listing is
    // treated as a conservative 5 units; any other status without a
    // count means none.
    let stock = match (payload.inventory_count, payload.availability.as_str()) {
        (None, "IN_STOCK") => 5,
        (None, _) => 0,
        (Some(count), "IN_STOCK") => clamp_stock(count),
        (Some(_), _) => 0,
    };

    build(
        &payload.product_id,
        vendor,
        payload.unit_price,
        stock,
        observed_at,
        now,
        freshness,
    )
}

fn normalize_depotline(
    payload: &DepotlinePayload,
    now: UtcDateTime,
    freshness: Duration,
) -> Normalized {
    let vendor = VendorId::Depotline;
    let Ok(observed_at) = UtcDateTime::from_unix_seconds(payload.timestamp) else {
        return Normalized::Discarded {
            vendor,
            reason: DiscardReason::BadTimestamp,
        };
    };

    let Some(price) = parse_dollar_price(&payload.cost_per_unit) else {
        return Normalized::Discarded {
            vendor,
            reason: DiscardReason::InvalidPrice,
        };
    };

    let stock = if payload.stock_status == "AVAILABLE" {
        clamp_stock(payload.quantity_on_hand)
    } else {
        0
    };

    build(&payload.sku, vendor, price, stock, observed_at, now, freshness)
}

fn normalize_mercantile(
    payload: &MercantilePayload,
    now: UtcDateTime,
    freshness: Duration,
) -> Normalized {
    let vendor = VendorId::Mercantile;
    let Ok(observed_at) = UtcDateTime::parse_legacy(&payload.data_timestamp) else {
        return Normalized::Discarded {
            vendor,
            reason: DiscardReason::BadTimestamp,
        };
    };

    let stock = if payload.status == "ACTIVE" {
        payload
            .stock_level
            .as_deref()
            .map(parse_legacy_stock)
            .unwrap_or(0)
    } else {
        0
    };

    let Some(price) = payload.price_amount else {
        return Normalized::Discarded {
            vendor,
            reason: DiscardReason::InvalidPrice,
        };
    };

    build(
        &payload.item_code,
        vendor,
        price,
        stock,
        observed_at,
        now,
        freshness,
    )
}

#[allow(clippy::too_many_arguments)]
fn build(
    sku: &str,
    vendor: VendorId,
    price: f64,
    stock: u32,
    observed_at: UtcDateTime,
    now: UtcDateTime,
    freshness: Duration,
) -> Normalized {
    let Ok(sku) = Sku::parse(sku) else {
        return Normalized::Discarded {
            vendor,
            reason: DiscardReason::BadSku,
        };
    };

    let usable = observed_at.age_at(now) <= freshness;
    match CanonicalOffer::new(sku, vendor, price, stock, observed_at, usable) {
        Ok(offer) => Normalized::Offer(offer),
        Err(_) => Normalized::Discarded {
            vendor,
            reason: DiscardReason::InvalidPrice,
        },
    }
}

fn clamp_stock(count: i64) -> u32 {
    count.clamp(0, i64::from(u32::MAX)) as u32
}

fn parse_dollar_price(raw: &str) -> Option<f64> {
    let stripped = raw.trim().trim_start_matches('$');
    stripped.parse::<f64>().ok()
}

/// Legacy stock levels: numeric string, "LOW" (3), "HIGH" (25), or
/// anything else counts as empty.
fn parse_legacy_stock(raw: &str) -> u32 {
    if let Ok(count) = raw.parse::<i64>() {
        return clamp_stock(count);
    }
    match raw {
        "LOW" => 3,
        "HIGH" => 25,
        _ => 0,
    }
}
