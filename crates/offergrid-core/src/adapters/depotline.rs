use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::adapters::{decode_or_fixture, OUT_OF_STOCK_SKU};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient};
use crate::vendor::{DepotlinePayload, RawVendorOffer, VendorClient, VendorError};
use crate::{Sku, UtcDateTime, VendorId};

/// Warehouse management vendor client.
#[derive(Clone)]
pub struct DepotlineClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    auth: HttpAuth,
}

impl Default for DepotlineClient {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            base_url: String::from("http://localhost:8003"),
            auth: HttpAuth::None,
        }
    }
}

impl DepotlineClient {
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

    fn fixture(sku: &Sku) -> DepotlinePayload {
        let out_of_stock = sku.as_str() == OUT_OF_STOCK_SKU;
        DepotlinePayload {
            sku: sku.as_str().to_owned(),
            stock_status: if out_of_stock {
                String::from("UNAVAILABLE")
            } else {
                String::from("AVAILABLE")
            },
            quantity_on_hand: if out_of_stock { 0 } else { 15 },
            cost_per_unit: String::from("$18.50"),
            timestamp: UtcDateTime::now().into_inner().unix_timestamp(),
        }
    }
}

impl VendorClient for DepotlineClient {
    fn id(&self) -> VendorId {
        VendorId::Depotline
    }

    fn fetch<'a>(
        &'a self,
        sku: &'a Sku,
    ) -> Pin<Box<dyn Future<Output = Result<RawVendorOffer, VendorError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/inventory/{}",
                self.base_url,
                urlencoding::encode(sku.as_str())
            );
            let request = HttpRequest::get(url).with_auth(&self.auth);

            let response = self.http_client.execute(request).await.map_err(|e| {
                if e.timed_out() {
                    VendorError::timeout(VendorId::Depotline, e.message())
                } else {
                    VendorError::transport(VendorId::Depotline, e.message())
                }
            })?;

            if !response.is_success() {
                return Err(VendorError::transport(
                    VendorId::Depotline,
                    format!("upstream returned status {}", response.status),
                ));
            }

            let payload =
                decode_or_fixture(VendorId::Depotline, &response.body, || Self::fixture(sku))?;
            Ok(RawVendorOffer::Depotline(payload))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_reports_dollar_prefixed_price() {
        let client = DepotlineClient::default();
        let sku = Sku::parse("ABC123").expect("valid sku");

        let raw = client.fetch(&sku).await.expect("fetch should succeed");
        let RawVendorOffer::Depotline(payload) = raw else {
            panic!("expected depotline payload");
        };

        assert_eq!(payload.cost_per_unit, "$18.50");
        assert_eq!(payload.quantity_on_hand, 15);
        assert_eq!(payload.stock_status, "AVAILABLE");
    }

    #[tokio::test]
    async fn fixture_empties_stock_for_out_sku() {
        let client = DepotlineClient::default();
        let sku = Sku::parse(OUT_OF_STOCK_SKU).expect("valid sku");

        let raw = client.fetch(&sku).await.expect("fetch should succeed");
        let RawVendorOffer::Depotline(payload) = raw else {
            panic!("expected depotline payload");
        };

        assert_eq!(payload.stock_status, "UNAVAILABLE");
        assert_eq!(payload.quantity_on_hand, 0);
    }
}
