//! Подставной шлюз хранилища и фабрики строк для тестов импорта

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contracts::domain::a025_product::{NormalizedProduct, ProductRecord, ProductUpdate};
use contracts::domain::a026_category::{CategoryWithFlavors, Flavor};
use contracts::usecases::u508_import_products_excel::{ExcelRow, ProductField};
use tokio::sync::Notify;

use super::excel_reader::SpreadsheetUpload;
use crate::shared::gateway::{GatewayError, InventoryGateway};

fn flavor(id: i64, name: &str, status: i32) -> Flavor {
    Flavor {
        id: serde_json::json!(id),
        name: name.to_string(),
        status,
    }
}

/// Задвижка перед массовой загрузкой: `entered` - вызов начался, `release` - пропустить
#[derive(Default)]
pub struct BulkGate {
    pub entered: Notify,
    pub release: Notify,
}

/// In-memory хранилище с журналом вызовов
pub struct FakeGateway {
    pub categories: Vec<String>,
    pub catalog: Vec<CategoryWithFlavors>,
    products: Mutex<HashMap<String, ProductRecord>>,
    updates: Mutex<Vec<(String, ProductUpdate)>>,
    bulk_imports: Mutex<Vec<(Vec<NormalizedProduct>, bool)>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
    unreachable: bool,
    fail_bulk: bool,
    bulk_gate: Option<Arc<BulkGate>>,
    failing_lookups: HashSet<String>,
    failing_writes: HashSet<String>,
}

impl FakeGateway {
    /// Каталог мороженого: у Helados 4 вкуса (3 активных), у Paletas 2,
    /// у Bebidas ни одного, Toppings есть только в списке категорий.
    pub fn ice_cream() -> Self {
        Self {
            categories: vec![
                "Helados".into(),
                "Paletas".into(),
                "Bebidas".into(),
                "Toppings".into(),
                "  ".into(),
            ],
            catalog: vec![
                CategoryWithFlavors {
                    category_name: "Helados".into(),
                    flavors: vec![
                        flavor(1, "Fresa", 1),
                        flavor(2, "Chocolate", 1),
                        flavor(3, "Vainilla", 1),
                        flavor(4, "Menta", 0),
                    ],
                },
                CategoryWithFlavors {
                    category_name: "Paletas".into(),
                    flavors: vec![flavor(5, "Limon", 1), flavor(6, "Mango", 1)],
                },
                CategoryWithFlavors {
                    category_name: "Bebidas".into(),
                    flavors: vec![],
                },
            ],
            products: Mutex::new(HashMap::new()),
            updates: Mutex::new(Vec::new()),
            bulk_imports: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(100),
            unreachable: false,
            fail_bulk: false,
            bulk_gate: None,
            failing_lookups: HashSet::new(),
            failing_writes: HashSet::new(),
        }
    }

    /// Каталог не отвечает
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn with_existing(self, code: &str) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.products.lock().unwrap().insert(
            code.to_string(),
            ProductRecord {
                id,
                code: code.to_string(),
                name: None,
            },
        );
        self
    }

    pub fn failing_lookup(mut self, code: &str) -> Self {
        self.failing_lookups.insert(code.to_string());
        self
    }

    pub fn failing_write(mut self, code: &str) -> Self {
        self.failing_writes.insert(code.to_string());
        self
    }

    pub fn failing_bulk(mut self) -> Self {
        self.fail_bulk = true;
        self
    }

    /// `bulk_import` ждёт `release` перед записью
    pub fn with_bulk_gate(mut self) -> Self {
        self.bulk_gate = Some(Arc::new(BulkGate::default()));
        self
    }

    pub fn bulk_gate(&self) -> Option<Arc<BulkGate>> {
        self.bulk_gate.clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Количество вызовов, начинающихся с `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn bulk_imports(&self) -> Vec<(Vec<NormalizedProduct>, bool)> {
        self.bulk_imports.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, ProductUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn stored_id(&self, code: &str) -> Option<String> {
        self.products.lock().unwrap().get(code).map(|p| p.id.clone())
    }
}

#[async_trait]
impl InventoryGateway for FakeGateway {
    async fn category_names(&self) -> Result<Vec<String>, GatewayError> {
        self.record("category_names".into());
        if self.unreachable {
            return Err(GatewayError::Transport("connection refused".into()));
        }
        Ok(self.categories.clone())
    }

    async fn categories_with_flavors(&self) -> Result<Vec<CategoryWithFlavors>, GatewayError> {
        self.record("categories_with_flavors".into());
        if self.unreachable {
            return Err(GatewayError::Transport("connection refused".into()));
        }
        Ok(self.catalog.clone())
    }

    async fn find_product_by_code(
        &self,
        code: &str,
    ) -> Result<Option<ProductRecord>, GatewayError> {
        self.record(format!("find_product_by_code:{}", code));
        if self.failing_lookups.contains(code) {
            return Err(GatewayError::Status {
                status: 500,
                body: "lookup failed".into(),
            });
        }
        Ok(self.products.lock().unwrap().get(code).cloned())
    }

    async fn create_product(&self, product: &NormalizedProduct) -> Result<String, GatewayError> {
        self.record(format!("create_product:{}", product.code));
        if self.failing_writes.contains(&product.code) {
            return Err(GatewayError::Status {
                status: 422,
                body: "rejected".into(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.products.lock().unwrap().insert(
            product.code.clone(),
            ProductRecord {
                id: id.clone(),
                code: product.code.clone(),
                name: Some(product.name.clone()),
            },
        );
        Ok(id)
    }

    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<(), GatewayError> {
        self.record(format!("update_product:{}", id));
        let code = self
            .products
            .lock()
            .unwrap()
            .values()
            .find(|p| p.id == id)
            .map(|p| p.code.clone());
        if code.is_some_and(|c| self.failing_writes.contains(&c)) {
            return Err(GatewayError::Status {
                status: 422,
                body: "rejected".into(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), update.clone()));
        Ok(())
    }

    async fn bulk_import(
        &self,
        products: &[NormalizedProduct],
        replace_all: bool,
    ) -> Result<usize, GatewayError> {
        self.record("bulk_import".into());
        if let Some(gate) = &self.bulk_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail_bulk {
            return Err(GatewayError::Status {
                status: 500,
                body: "bulk import failed".into(),
            });
        }
        self.bulk_imports
            .lock()
            .unwrap()
            .push((products.to_vec(), replace_all));
        Ok(products.len())
    }
}

/// Полностью заполненная строка (без Image_URL)
pub fn full_row(row_number: usize, code: &str, category: &str, flavor_count: &str) -> ExcelRow {
    ExcelRow::new(row_number)
        .with(ProductField::Code, code)
        .with(ProductField::Category, category)
        .with(ProductField::Name, format!("Paleta {}", code))
        .with(ProductField::Cost, "1.5")
        .with(ProductField::Price, "3")
        .with(ProductField::Stock, "10")
        .with(ProductField::Barcode, format!("775{}", code))
        .with(ProductField::Unit, "PZA")
        .with(ProductField::FlavorCount, flavor_count)
        .with(ProductField::Description, "Sabor de temporada")
}

/// Загрузка со всеми колонками шаблона
pub fn upload_of(rows: Vec<ExcelRow>) -> SpreadsheetUpload {
    SpreadsheetUpload {
        file_name: Some("products.xlsx".into()),
        headers: ProductField::ALL
            .iter()
            .map(|f| f.header().to_string())
            .collect(),
        rows,
    }
}

/// Тело запроса в формате ExcelData
pub fn excel_json(rows: &[ExcelRow]) -> Vec<u8> {
    let columns: Vec<&str> = ProductField::ALL.iter().map(|f| f.header()).collect();
    let rows: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for field in ProductField::ALL {
                if let Some(v) = row.get(field) {
                    obj.insert(field.header().to_string(), serde_json::json!(v));
                }
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "metadata": {
            "columns": columns,
            "row_count": rows.len(),
            "file_name": "products.xlsx"
        },
        "rows": rows
    }))
    .unwrap()
}
