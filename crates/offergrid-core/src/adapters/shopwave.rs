use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapters::{decode_or_fixture, NULL_INVENTORY_SKU, OUT_OF_STOCK_SKU};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient};
use crate::vendor::{RawVendorOffer, ShopwavePayload, VendorClient, VendorError};
use crate::{Sku, UtcDateTime, VendorId};

/// E-commerce storefront vendor client.
#[derive(Clone)]
pub struct ShopwaveClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    auth: HttpAuth,
}

impl Default for ShopwaveClient {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            base_url: String::from("http://localhost:8002"),
            auth: HttpAuth::None,
        }
    }
}

impl ShopwaveClient {
    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        auth: HttpAuth,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            auth,
        }
    }

    fn fixture(sku: &Sku) -> ShopwavePayload {
        let out_of_stock = sku.as_str() == OUT_OF_STOCK_SKU;
        ShopwavePayload {
            product_id: sku.as_str().to_owned(),
            availability: if out_of_stock {
                String::from("OUT_OF_STOCK")
            } else {
                String::from("IN_STOCK")
            },
            inventory_count: if sku.as_str() == NULL_INVENTORY_SKU {
                None
            } else {
                Some(10)
            },
            unit_price: 19.99,
            last_updated: UtcDateTime::now().format_rfc3339(),
        }
    }
}

impl VendorClient for ShopwaveClient {
    fn id(&self) -> VendorId {
        VendorId::Shopwave
    }

    fn fetch<'a>(
        &'a self,
        sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/products/{}",
                self.base_url,
                urlencoding::encode(sku.as_str())
            );
            let request = HttpRequest::get(url).with_auth(&self.auth);

            let response = self.http_client.execute(request).await.map_err(|e| {
                if e.timed_out() {
                    VendorError::timeout(VendorId::Shopwave, e.message())
                } else {
                    VendorError::transport(VendorId::Shopwave, e.message())
                }
            })?;

            if !response.is_success() {
                return Err(VendorError::transport(
                    VendorId::Shopwave,
                    format!("upstream returned status {}", response.status),
                ));
            }

            let payload =
                decode_or_fixture(VendorId::Shopwave, &response.body, || Self::fixture(sku))?;
            Ok(RawVendorOffer::Shopwave(payload))
        })
    }
}
