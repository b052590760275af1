use serde::{Deserialize, Serialize};

use super::excel::{ExcelRow, ProductField};
use crate::domain::a026_category::FlavorSummary;

/// Код причины, по которой категория / количество вкусов не прошли проверку
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueReason {
    EmptyCategory,
    CategoryNotFound,
    EmptyFlavorCount,
    InvalidNumber,
    NegativeNotAllowed,
    CategoryNotFoundInFlavors,
    ExceededLimit,
}

/// Ошибка проверки пары категория + Flavor_Count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFlavorIssue {
    pub reason: IssueReason,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_allowed: Option<u32>,
}

/// Проблемы одной строки
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowIssues {
    #[serde(default)]
    pub empty_fields: Vec<ProductField>,
    /// Cost/Price/Stock, которые не читаются как число (в `row` очищены)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_numbers: Vec<ProductField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_flavor_issue: Option<CategoryFlavorIssue>,
}

impl RowIssues {
    pub fn is_empty(&self) -> bool {
        self.empty_fields.is_empty()
            && self.invalid_numbers.is_empty()
            && self.category_flavor_issue.is_none()
    }
}

/// Строка после классификации.
///
/// `original_row` - как в файле, не меняется. `row` - проверенное представление:
/// Category/Flavor_Count заменены каноническими значениями или очищены, если проверка не прошла.
/// `issues == None` означает полную (Complete) строку.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub row_number: usize,
    pub original_row: ExcelRow,
    pub row: ExcelRow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<RowIssues>,
}

impl ValidatedRow {
    pub fn is_complete(&self) -> bool {
        self.issues.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub total_rows: usize,
    pub complete_rows: usize,
    pub incomplete_rows: usize,
}

/// Результат проверки всего файла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub complete_rows: Vec<ValidatedRow>,
    pub incomplete_rows: Vec<ValidatedRow>,
    pub categories_with_flavors: Vec<FlavorSummary>,
    pub summary: ClassificationSummary,
}
