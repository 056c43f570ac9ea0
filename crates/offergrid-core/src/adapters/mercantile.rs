use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use time::format_description;

use crate::adapters::{decode_or_fixture, FLAKY_SKU_SUFFIX, HARD_FAIL_SKU, OUT_OF_STOCK_SKU};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient};
use crate::vendor::{MercantilePayload, RawVendorOffer, VendorClient, VendorError};
use crate::{Sku, UtcDateTime, VendorId};

/// Legacy fulfilment vendor client.
///
/// The slowest and least reliable of the three feeds. In fixture mode
/// it reproduces that profile deterministically: `FAIL123` always
/// fails, SKUs ending in `456` fail their first attempt and recover on
/// retry.
pub struct MercantileClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    auth: HttpAuth,
    flaked: AtomicBool,
}

impl Default for MercantileClient {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            base_url: String::from("http://localhost:8004"),
            auth: HttpAuth::None,
            flaked: AtomicBool::new(false),
        }
    }
}

impl MercantileClient {
    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        auth: HttpAuth,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            auth,
            flaked: AtomicBool::new(false),
        }
    }

    fn fixture(sku: &Sku) -> MercantilePayload {
        let inactive = sku.as_str() == OUT_OF_STOCK_SKU;
        let observed = UtcDateTime::now().into_inner() - time::Duration::minutes(2);
        MercantilePayload {
            item_code: sku.as_str().to_owned(),
            status: if inactive {
                String::from("INACTIVE")
            } else {
                String::from("ACTIVE")
            },
            stock_level: if inactive {
                None
            } else {
                Some(String::from("20"))
            },
            price_amount: Some(17.75),
            data_timestamp: legacy_timestamp(observed),
        }
    }

    fn simulated_failure(&self, sku: &Sku) -> Option<VendorError> {
        if sku.as_str() == HARD_FAIL_SKU {
            return Some(VendorError::transport(
                VendorId::Mercantile,
                "legacy backend rejected the request",
            ));
        }

        if sku.as_str().ends_with(FLAKY_SKU_SUFFIX) && !self.flaked.swap(true, Ordering::SeqCst) {
            return Some(VendorError::transport(
                VendorId::Mercantile,
                "legacy backend dropped the connection",
            ));
        }

        None
    }
}

fn legacy_timestamp(ts: time::OffsetDateTime) -> String {
    let format = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .expect("legacy format description is well-formed");
    ts.format(&format)
        .unwrap_or_else(|_| String::from("1970-01-01 00:00:00"))
}

impl VendorClient for MercantileClient {
    fn id(&self) -> VendorId {
        VendorId::Mercantile
    }

    fn fetch<'a>(
        &'a self,
        sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/items/{}",
                self.base_url,
                urlencoding::encode(sku.as_str())
            );
            let request = HttpRequest::get(url).with_auth(&self.auth);

            let response = self.http_client.execute(request).await.map_err(|e| {
                if e.timed_out() {
                    VendorError::timeout(VendorId::Mercantile, e.message())
                } else {
                    VendorError::transport(VendorId::Mercantile, e.message())
                }
            })?;

            if !response.is_success() {
                return Err(VendorError::transport(
                    VendorId::Mercantile,
                    format!("upstream returned status {}", response.status),
                ));
            }

            if let Some(error) = self.simulated_failure(sku) {
                return Err(error);
            }

            let payload =
                decode_or_fixture(VendorId::Mercantile, &response.body, || Self::fixture(sku))?;
            Ok(RawVendorOffer::Mercantile(payload))
        })
    }
}
