pub mod http_client;

pub use http_client::HttpInventoryGateway;

use async_trait::async_trait;
use contracts::domain::a025_product::{NormalizedProduct, ProductRecord, ProductUpdate};
use contracts::domain::a026_category::CategoryWithFlavors;
use thiserror::Error;

/// Ошибки обращения к хранилищу товаров
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Хранилище товаров (внешний сервис). Ядро импорта работает только через этот трейт.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Список названий категорий
    async fn category_names(&self) -> Result<Vec<String>, GatewayError>;

    /// Категории вместе со вкусами
    async fn categories_with_flavors(&self) -> Result<Vec<CategoryWithFlavors>, GatewayError>;

    /// Поиск товара по точному коду
    async fn find_product_by_code(&self, code: &str)
        -> Result<Option<ProductRecord>, GatewayError>;

    /// Создать товар, возвращает id
    async fn create_product(&self, product: &NormalizedProduct) -> Result<String, GatewayError>;

    /// Обновить изменяемые поля товара
    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<(), GatewayError>;

    /// Массовая загрузка; `replace_all = true` заменяет весь набор товаров
    async fn bulk_import(
        &self,
        products: &[NormalizedProduct],
        replace_all: bool,
    ) -> Result<usize, GatewayError>;
}
