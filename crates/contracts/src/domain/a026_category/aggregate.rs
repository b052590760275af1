use serde::{Deserialize, Serialize};

/// Статус активного вкуса в каталоге
pub const FLAVOR_STATUS_ACTIVE: i32 = 1;

/// Вкус из каталога категорий
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: serde_json::Value,
    pub name: String,
    pub status: i32,
}

impl Flavor {
    pub fn is_active(&self) -> bool {
        self.status == FLAVOR_STATUS_ACTIVE
    }
}

/// Категория вместе со списком вкусов (ответ GET categories-with-flavors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWithFlavors {
    #[serde(rename = "categoryName", alias = "category_name")]
    pub category_name: String,
    #[serde(default)]
    pub flavors: Vec<Flavor>,
}

/// Сводка по вкусам одной категории.
/// `max_flavors` - сколько вкусов можно указать в Flavor_Count (число активных).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorSummary {
    pub name: String,
    pub max_flavors: u32,
    pub total_flavors: u32,
    pub active_flavors: u32,
    pub flavor_names: Vec<String>,
}

impl FlavorSummary {
    pub fn from_catalog(entry: &CategoryWithFlavors) -> Self {
        let active: Vec<&Flavor> = entry.flavors.iter().filter(|f| f.is_active()).collect();
        Self {
            name: entry.category_name.trim().to_string(),
            max_flavors: active.len() as u32,
            total_flavors: entry.flavors.len() as u32,
            active_flavors: active.len() as u32,
            flavor_names: active.iter().map(|f| f.name.clone()).collect(),
        }
    }
}
