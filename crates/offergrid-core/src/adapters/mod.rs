//! Vendor client implementations, one per upstream schema.
//!
//! Each client issues a real transport call through its [`HttpClient`]
//! and decodes the body as its vendor schema. The default no-op
//! transport answers `200 {}`, in which case the client falls back to a
//! deterministic fixture payload keyed off the SKU, so the whole
//! pipeline runs offline with reproducible data.
//!
//! [`HttpClient`]: crate::http_client::HttpClient

mod depotline;
mod mercantile;
mod shopwave;

pub use depotline::DepotlineClient;
pub use mercantile::MercantileClient;
pub use shopwave::ShopwaveClient;

use serde::de::DeserializeOwned;

use crate::{VendorError, VendorId};

/// SKU that every vendor reports as out of stock in fixture mode.
pub const OUT_OF_STOCK_SKU: &str = "OUT123";
/// SKU for which shopwave omits its inventory count in fixture mode.
pub const NULL_INVENTORY_SKU: &str = "NULL123";
/// SKU that mercantile hard-fails in fixture mode.
pub const HARD_FAIL_SKU: &str = "FAIL123";
/// SKU suffix that makes mercantile fail its first attempt only.
pub const FLAKY_SKU_SUFFIX: &str = "456";

fn decode_or_fixture<T, F>(vendor: VendorId, body: &str, fixture: F) -> Result<T, VendorError>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return Ok(fixture());
    }

    serde_json::from_str(trimmed).map_err(|e| {
        VendorError::malformed_payload(vendor, format!("undecodable payload: {}", e))
    })
}
