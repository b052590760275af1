use async_trait::async_trait;
use contracts::domain::a025_product::{
    BulkImportRequest, BulkImportResponse, CreatedProduct, NormalizedProduct, ProductLookup,
    ProductRecord, ProductUpdate,
};
use contracts::domain::a026_category::CategoryWithFlavors;
use serde::de::DeserializeOwned;

use super::{GatewayError, InventoryGateway};
use crate::shared::config::GatewayConfig;

/// HTTP-клиент для API хранилища товаров
pub struct HttpInventoryGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryGateway {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .no_proxy()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Проверить статус и распарсить JSON
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        url: &str,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Inventory API {} returned {}: {}", url, status, body);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            tracing::error!("Failed to parse response from {}: {} ({})", url, e, preview);
            GatewayError::Decode(format!("{}: {}", url, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let url = self.url(path);
        tracing::debug!("Inventory API: GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("GET {}: {}", url, e)))?;
        Self::read_json(response, &url).await
    }
}

/// `found: true` без товара - ответ битый: считать его "не найдено" нельзя,
/// иначе upsert создаст дубль существующего кода
fn lookup_result(code: &str, lookup: ProductLookup) -> Result<Option<ProductRecord>, GatewayError> {
    match (lookup.found, lookup.product) {
        (true, Some(product)) => Ok(Some(product)),
        (true, None) => Err(GatewayError::Decode(format!(
            "lookup of '{}' reported found without a product",
            code
        ))),
        (false, _) => Ok(None),
    }
}

#[async_trait]
impl InventoryGateway for HttpInventoryGateway {
    async fn category_names(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json("/categories/names").await
    }

    async fn categories_with_flavors(&self) -> Result<Vec<CategoryWithFlavors>, GatewayError> {
        self.get_json("/categories/with-flavors").await
    }

    async fn find_product_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ProductRecord>, GatewayError> {
        let path = format!("/products/by-code/{}", urlencoding::encode(code));
        let lookup: ProductLookup = self.get_json(&path).await?;
        lookup_result(code, lookup)
    }

    async fn create_product(&self, product: &NormalizedProduct) -> Result<String, GatewayError> {
        let url = self.url("/products");
        tracing::debug!("Inventory API: POST {} code={}", url, product.code);
        let response = self
            .client
            .post(&url)
            .json(product)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("POST {}: {}", url, e)))?;
        let created: CreatedProduct = Self::read_json(response, &url).await?;
        Ok(created.id)
    }

    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<(), GatewayError> {
        let url = self.url(&format!("/products/{}", urlencoding::encode(id)));
        tracing::debug!("Inventory API: PUT {}", url);
        let response = self
            .client
            .put(&url)
            .json(update)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("PUT {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn bulk_import(
        &self,
        products: &[NormalizedProduct],
        replace_all: bool,
    ) -> Result<usize, GatewayError> {
        let url = self.url("/products/bulk-import");
        tracing::info!(
            "Inventory API: POST {} ({} products, replace_all={})",
            url,
            products.len(),
            replace_all
        );
        let body = BulkImportRequest {
            products: products.to_vec(),
            replace_all,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("POST {}: {}", url, e)))?;
        let result: BulkImportResponse = Self::read_json(response, &url).await?;
        Ok(result.imported)
    }
}
