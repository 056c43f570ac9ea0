//! Best-offer selection.
//!
//! Pure function over the set of canonical offers for one SKU. The
//! output depends only on the set, never on the arrival order of the
//! underlying vendor responses; every comparison that could tie is
//! broken by vendor id.

use crate::{CanonicalOffer, SelectionResult, SelectionStatus, Sku, UtcDateTime};

/// Relative price premium above which a higher-stock offer overrides a
/// cheaper one.
pub const PRICE_DIFFERENCE_THRESHOLD: f64 = 0.10;

/// Select the best offer for `sku` from the offers gathered this cycle.
///
/// `vendors_checked` is the number of vendors that returned any payload
/// (usable or not); stale and discarded offers count toward it but
/// never influence the decision. Offers whose freshness check failed
/// are excluded here, so callers may pass the full normalized set.
pub fn select_best(
    sku: &Sku,
    offers: &[CanonicalOffer],
    vendors_checked: u32,
    computed_at: UtcDateTime,
) -> SelectionResult {
    let mut usable = offers
        .iter()
        .filter(|offer| offer.usable)
        .collect::<Vec<_>>();
    // Deterministic evaluation order regardless of response arrival.
    usable.sort_by(|a, b| a.vendor.cmp(&b.vendor));

    let vendors_usable = usable.len() as u32;

    if usable.is_empty() {
        return SelectionResult {
            sku: sku.clone(),
            best_vendor: None,
            price: None,
            stock: None,
            status: SelectionStatus::Unavailable,
            vendors_checked,
            vendors_usable,
            cache_hit: false,
            computed_at,
        };
    }

    let in_stock = usable
        .iter()
        .copied()
        .filter(|offer| offer.stock > 0)
        .collect::<Vec<_>>();

    if in_stock.is_empty() {
        // Everyone is empty: report the cheapest usable offer so the
        // response stays informative and reproducible.
        let cheapest = lowest_price(&usable);
        return SelectionResult {
            sku: sku.clone(),
            best_vendor: Some(cheapest.vendor),
            price: Some(cheapest.price),
            stock: Some(cheapest.stock),
            status: SelectionStatus::OutOfStock,
            vendors_checked,
            vendors_usable,
            cache_hit: false,
            computed_at,
        };
    }

    let base = lowest_price(&in_stock);
    let mut best = base;

    // A candidate overrides the running best only when its premium over
    // the cheapest offer exceeds the threshold AND it carries strictly
    // more stock. Iterating in vendor-id order makes stock ties resolve
    // to the smallest vendor id.
    for &candidate in &in_stock {
        if std::ptr::eq(candidate, base) {
            continue;
        }
        let premium = (candidate.price - base.price) / base.price;
        if premium > PRICE_DIFFERENCE_THRESHOLD && candidate.stock > best.stock {
            best = candidate;
        }
    }

    SelectionResult {
        sku: sku.clone(),
        best_vendor: Some(best.vendor),
        price: Some(best.price),
        stock: Some(best.stock),
        status: SelectionStatus::Available,
        vendors_checked,
        vendors_usable,
        cache_hit: false,
        computed_at,
    }
}

/// Lowest price, ties broken by smallest vendor id. Input is already
/// vendor-sorted, so a strict `<` keeps the first of any price tie.
fn lowest_price<'a>(offers: &[&'a CanonicalOffer]) -> &'a CanonicalOffer {
    let mut best = offers[0];
    for &offer in &offers[1..] {
        if offer.price < best.price {
            best = offer;
        }
    }
    best
}
