use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Normalized product (то, что уходит в хранилище)
// ============================================================================

/// Товар после нормализации строки Excel.
/// Свободный текст приведён к нижнему регистру и обрезан, числа распарсены.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    pub code: String,
    pub name: String,
    pub category: String,
    pub cost: f64,
    pub price: f64,
    pub stock: i64,
    pub barcode: String,
    pub unit: String,
    pub flavor_count: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NormalizedProduct {
    /// Изменяемые поля для PUT. Код товара - неизменяемый ключ и сюда не попадает.
    pub fn to_update(&self) -> ProductUpdate {
        ProductUpdate {
            name: self.name.clone(),
            category: self.category.clone(),
            cost: self.cost,
            price: self.price,
            stock: self.stock,
            barcode: self.barcode.clone(),
            unit: self.unit.clone(),
            flavor_count: self.flavor_count,
            description: self.description.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Тело PUT product(id). Поля `code` здесь нет намеренно - его нельзя переотправить.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub category: String,
    pub cost: f64,
    pub price: f64,
    pub stock: i64,
    pub barcode: String,
    pub unit: String,
    pub flavor_count: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ============================================================================
// Gateway responses
// ============================================================================

/// Товар, уже существующий в хранилище
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Ответ GET product-by-code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLookup {
    pub found: bool,
    #[serde(default)]
    pub product: Option<ProductRecord>,
}

/// Ответ POST product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedProduct {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Тело POST bulk-import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportRequest {
    pub products: Vec<NormalizedProduct>,
    pub replace_all: bool,
}

/// Ответ POST bulk-import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkImportResponse {
    pub imported: usize,
}

/// Хранилище отдаёт id то строкой, то числом
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
