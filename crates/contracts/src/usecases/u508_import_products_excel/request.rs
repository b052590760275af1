use serde::{Deserialize, Serialize};

use super::excel::ProductField;
use crate::enums::import_mode::ImportMode;

/// Запрос на смену режима импорта. Значение проверяется на сервере.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetImportModeRequest {
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportModeResponse {
    pub mode: ImportMode,
    pub available: Vec<ImportMode>,
}

/// Правка одного поля строки в сессии ручной корректировки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFieldRequest {
    pub field: ProductField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigateDirection {
    Next,
    Prev,
}
