// Shared test doubles and builders for the behavioral test suites.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

pub use std::sync::Arc;

pub use offergrid_core::{
    vendor::{DepotlinePayload, MercantilePayload, ShopwavePayload},
    RawVendorOffer, SelectionResult, SelectionStore, Sku, StoreError, UtcDateTime, VendorClient,
    VendorError, VendorId,
};

/// Vendor double that plays back a scripted response sequence, then
/// repeats its configured steady response (or a transport error when
/// none was given).
pub struct ScriptedVendor {
    id: VendorId,
    script: Mutex<VecDeque<Result<RawVendorOffer, VendorError>>>,
    steady: Option<Result<RawVendorOffer, VendorError>>,
}

impl ScriptedVendor {
    pub fn steady(offer: RawVendorOffer) -> Self {
        Self {
            id: offer.vendor(),
            script: Mutex::new(VecDeque::new()),
            steady: Some(Ok(offer)),
        }
    }

    pub fn always_failing(id: VendorId) -> Self {
        Self {
            id,
            script: Mutex::new(VecDeque::new()),
            steady: Some(Err(VendorError::transport(id, "scripted outage"))),
        }
    }

    pub fn sequence(id: VendorId, responses: Vec<Result<RawVendorOffer, VendorError>>) -> Self {
        Self {
            id,
            script: Mutex::new(responses.into()),
            steady: None,
        }
    }
}

impl VendorClient for ScriptedVendor {
    fn id(&self) -> VendorId {
        self.id
    }

    fn fetch<'a>(
        &'a self,
        _sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>> {
        let next = self
            .script
            .lock()
            .expect("script lock is not poisoned")
            .pop_front()
            .or_else(|| self.steady.clone())
            .unwrap_or_else(|| Err(VendorError::transport(self.id, "script exhausted")));
        Box::pin(async move { next })
    }
}

/// Store double whose every operation fails, simulating an unreachable
/// cache backend.
#[derive(Debug, Default)]
pub struct FailingStore;

impl SelectionStore for FailingStore {
    fn get<'a>(
        &'a self,
        _sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SelectionResult>, StoreError>> + Send + 'a>>
    {
        Box::pin(async { Err(StoreError::unavailable("injected outage")) })
    }

    fn put<'a>(
        &'a self,
        _sku: &'a Sku,
        _result: SelectionResult,
        _ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async { Err(StoreError::unavailable("injected outage")) })
    }
}

pub fn shopwave_offer(sku: &str, unit_price: f64, inventory: Option<i64>) -> RawVendorOffer {
    RawVendorOffer::Shopwave(ShopwavePayload {
        product_id: sku.to_owned(),
        availability: String::from("IN_STOCK"),
        inventory_count: inventory,
        unit_price,
        last_updated: UtcDateTime::now().format_rfc3339(),
    })
}

pub fn depotline_offer(sku: &str, cost_per_unit: &str, quantity: i64) -> RawVendorOffer {
    RawVendorOffer::Depotline(DepotlinePayload {
        sku: sku.to_owned(),
        stock_status: String::from("AVAILABLE"),
        quantity_on_hand: quantity,
        cost_per_unit: cost_per_unit.to_owned(),
        timestamp: UtcDateTime::now().into_inner().unix_timestamp(),
    })
}

pub fn mercantile_offer(sku: &str, price: f64, stock_level: &str) -> RawVendorOffer {
    RawVendorOffer::Mercantile(MercantilePayload {
        item_code: sku.to_owned(),
        status: String::from("ACTIVE"),
        stock_level: Some(stock_level.to_owned()),
        price_amount: Some(price),
        data_timestamp: legacy_now(),
    })
}

fn legacy_now() -> String {
    let now = UtcDateTime::now().into_inner();
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
