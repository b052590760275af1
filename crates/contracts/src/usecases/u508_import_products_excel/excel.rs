use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Номер первой строки данных в таблице (строка 1 - заголовки)
pub const FIRST_DATA_ROW_NUMBER: usize = 2;

/// Колонка шаблона загрузки товаров
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductField {
    #[serde(rename = "Code")]
    Code,
    #[serde(rename = "Category")]
    Category,
    #[serde(rename = "Name")]
    Name,
    #[serde(rename = "Cost")]
    Cost,
    #[serde(rename = "Price")]
    Price,
    #[serde(rename = "Stock")]
    Stock,
    #[serde(rename = "Barcode")]
    Barcode,
    #[serde(rename = "Unit")]
    Unit,
    #[serde(rename = "Flavor_Count")]
    FlavorCount,
    #[serde(rename = "Description")]
    Description,
    #[serde(rename = "Image_URL")]
    ImageUrl,
}

impl ProductField {
    /// Все колонки шаблона в порядке следования
    pub const ALL: [ProductField; 11] = [
        ProductField::Code,
        ProductField::Category,
        ProductField::Name,
        ProductField::Cost,
        ProductField::Price,
        ProductField::Stock,
        ProductField::Barcode,
        ProductField::Unit,
        ProductField::FlavorCount,
        ProductField::Description,
        ProductField::ImageUrl,
    ];

    /// Обязательные колонки. Единственный источник правды для проверки заголовков
    /// и полноты строки; строгий (legacy) вариант добавляет к ним Image_URL.
    pub const REQUIRED: [ProductField; 10] = [
        ProductField::Code,
        ProductField::Category,
        ProductField::Name,
        ProductField::Cost,
        ProductField::Price,
        ProductField::Stock,
        ProductField::Barcode,
        ProductField::Unit,
        ProductField::FlavorCount,
        ProductField::Description,
    ];

    /// Денежные и складские колонки; Flavor_Count проверяется отдельно
    pub const NUMERIC: [ProductField; 3] =
        [ProductField::Cost, ProductField::Price, ProductField::Stock];

    /// Список обязательных колонок с учётом строгого режима
    pub fn required(require_image_url: bool) -> Vec<ProductField> {
        let mut fields = Self::REQUIRED.to_vec();
        if require_image_url {
            fields.push(ProductField::ImageUrl);
        }
        fields
    }

    /// Заголовок колонки в файле
    pub fn header(&self) -> &'static str {
        match self {
            ProductField::Code => "Code",
            ProductField::Category => "Category",
            ProductField::Name => "Name",
            ProductField::Cost => "Cost",
            ProductField::Price => "Price",
            ProductField::Stock => "Stock",
            ProductField::Barcode => "Barcode",
            ProductField::Unit => "Unit",
            ProductField::FlavorCount => "Flavor_Count",
            ProductField::Description => "Description",
            ProductField::ImageUrl => "Image_URL",
        }
    }

    /// Парсинг из заголовка (точное совпадение)
    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.header() == header)
    }
}

impl std::fmt::Display for ProductField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// Строка из Excel файла для импорта товаров.
/// Пустая ячейка = `None`; пробельная строка тоже считается пустой при проверке.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcelRow {
    pub row_number: usize,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub flavor_count: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ExcelRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            ..Default::default()
        }
    }

    pub fn get(&self, field: ProductField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: ProductField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    pub fn with(mut self, field: ProductField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Значение после trim; пустая строка превращается в `None`
    pub fn trimmed(&self, field: ProductField) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn is_blank(&self, field: ProductField) -> bool {
        self.trimmed(field).is_none()
    }

    /// Пустые поля из переданного списка (в порядке списка)
    pub fn empty_fields(&self, required: &[ProductField]) -> Vec<ProductField> {
        required
            .iter()
            .copied()
            .filter(|f| self.is_blank(*f))
            .collect()
    }

    fn slot(&self, field: ProductField) -> &Option<String> {
        match field {
            ProductField::Code => &self.code,
            ProductField::Category => &self.category,
            ProductField::Name => &self.name,
            ProductField::Cost => &self.cost,
            ProductField::Price => &self.price,
            ProductField::Stock => &self.stock,
            ProductField::Barcode => &self.barcode,
            ProductField::Unit => &self.unit,
            ProductField::FlavorCount => &self.flavor_count,
            ProductField::Description => &self.description,
            ProductField::ImageUrl => &self.image_url,
        }
    }

    fn slot_mut(&mut self, field: ProductField) -> &mut Option<String> {
        match field {
            ProductField::Code => &mut self.code,
            ProductField::Category => &mut self.category,
            ProductField::Name => &mut self.name,
            ProductField::Cost => &mut self.cost,
            ProductField::Price => &mut self.price,
            ProductField::Stock => &mut self.stock,
            ProductField::Barcode => &mut self.barcode,
            ProductField::Unit => &mut self.unit,
            ProductField::FlavorCount => &mut self.flavor_count,
            ProductField::Description => &mut self.description,
            ProductField::ImageUrl => &mut self.image_url,
        }
    }
}

/// ExcelData для приема с фронтенда: книга уже разобрана на клиенте,
/// строки приходят как "заголовок -> значение ячейки"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelData {
    pub metadata: ExcelMetadata,
    pub rows: Vec<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub file_headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelMetadata {
    #[serde(default)]
    pub columns: Vec<String>,
    pub row_count: usize,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        for field in ProductField::ALL {
            assert_eq!(ProductField::from_header(field.header()), Some(field));
        }
        assert_eq!(ProductField::from_header("flavor_count"), None);
    }

    #[test]
    fn test_required_lists() {
        assert_eq!(ProductField::required(false).len(), 10);
        let strict = ProductField::required(true);
        assert_eq!(strict.len(), 11);
        assert_eq!(strict.last(), Some(&ProductField::ImageUrl));
    }

    #[test]
    fn test_blank_detection() {
        let row = ExcelRow::new(2)
            .with(ProductField::Code, "A1")
            .with(ProductField::Name, "   ")
            .with(ProductField::Stock, "0");
        assert!(!row.is_blank(ProductField::Code));
        assert!(row.is_blank(ProductField::Name));
        assert!(row.is_blank(ProductField::Category));
        // ноль - это значение, а не пустота
        assert!(!row.is_blank(ProductField::Stock));
        assert_eq!(
            row.empty_fields(&[ProductField::Code, ProductField::Name, ProductField::Stock]),
            vec![ProductField::Name]
        );
    }

    #[test]
    fn test_field_serializes_as_header() {
        let json = serde_json::to_string(&ProductField::FlavorCount).unwrap();
        assert_eq!(json, "\"Flavor_Count\"");
    }
}
