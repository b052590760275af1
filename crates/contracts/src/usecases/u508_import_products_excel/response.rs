use serde::{Deserialize, Serialize};

use super::excel::{ExcelRow, ProductField};
use super::validation::{ClassificationResult, RowIssues};
use crate::domain::a026_category::FlavorSummary;
use crate::enums::import_mode::ImportMode;

/// Класс ошибки, остановившей импорт целиком
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    /// Файл не читается
    Parse,
    /// Файл не соответствует шаблону (нет заголовков / пустой)
    Structure,
    /// Каталог категорий / вкусов недоступен
    CatalogFetch,
    /// Массовая замена не прошла
    Commit,
    InvalidInput,
}

/// Действие UpsertProcessor над одной строкой
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertAction {
    Create,
    Update,
    Error,
}

/// Результат по одному коду товара
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertDetail {
    pub code: String,
    pub action: UpsertAction,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

/// Итог построчной записи
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    pub details: Vec<UpsertDetail>,
    pub summary: String,
}

impl UpsertSummary {
    /// Коды, по которым запись не удалась (для точечного повтора)
    pub fn failed_codes(&self) -> Vec<&str> {
        self.details
            .iter()
            .filter(|d| !d.success)
            .map(|d| d.code.as_str())
            .collect()
    }
}

/// Ответ на запуск импорта / на сохранение сессии корректировки.
/// Всегда содержит режим, которым был получен результат.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub import_mode: ImportMode,
    pub session_id: String,
    #[serde(default)]
    pub needs_manual_edit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<UpsertDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ClassificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ImportErrorKind>,
}

impl ImportResponse {
    fn base(session_id: String, import_mode: ImportMode, success: bool, message: String) -> Self {
        Self {
            success,
            message,
            import_mode,
            session_id,
            needs_manual_edit: false,
            imported: None,
            created: None,
            updated: None,
            errors: None,
            details: Vec::new(),
            data: None,
            error_kind: None,
        }
    }

    /// Полная замена прошла
    pub fn replaced(session_id: String, import_mode: ImportMode, imported: usize) -> Self {
        let mut response = Self::base(
            session_id,
            import_mode,
            true,
            format!("Импортировано товаров: {}", imported),
        );
        response.imported = Some(imported);
        response
    }

    /// Построчная запись завершена (возможно, с ошибками по отдельным кодам)
    pub fn upserted(session_id: String, import_mode: ImportMode, summary: UpsertSummary) -> Self {
        let mut response = Self::base(session_id, import_mode, true, summary.summary.clone());
        response.created = Some(summary.created);
        response.updated = Some(summary.updated);
        response.errors = Some(summary.errors);
        response.details = summary.details;
        response
    }

    /// Нужна ручная корректировка; `session_id` - id сессии корректировки
    pub fn needs_manual_edit(
        session_id: String,
        import_mode: ImportMode,
        data: ClassificationResult,
    ) -> Self {
        let message = format!(
            "Найдено строк с ошибками: {} (полных: {})",
            data.summary.incomplete_rows, data.summary.complete_rows
        );
        let mut response = Self::base(session_id, import_mode, false, message);
        response.needs_manual_edit = true;
        response.data = Some(data);
        response
    }

    pub fn failed(
        session_id: String,
        import_mode: ImportMode,
        kind: ImportErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let mut response = Self::base(session_id, import_mode, false, message.into());
        response.error_kind = Some(kind);
        response
    }
}

/// Строка в сессии корректировки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRowView {
    /// Индекс в списке неполных строк (не номер строки в файле)
    pub index: usize,
    pub row_number: usize,
    /// Текущие значения: проверенное представление + правки
    pub values: ExcelRow,
    pub editable_fields: Vec<ProductField>,
    pub issues: Option<RowIssues>,
    pub edited: bool,
}

/// Состояние сессии корректировки для UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSessionView {
    pub session_id: String,
    pub import_mode: ImportMode,
    pub complete_count: usize,
    pub incomplete_count: usize,
    pub deleted_count: usize,
    pub available_count: usize,
    pub rows: Vec<CorrectionRowView>,
    pub categories_with_flavors: Vec<FlavorSummary>,
}
