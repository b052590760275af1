use std::sync::Arc;

use contracts::usecases::u508_import_products_excel::{
    ClassificationResult, ClassificationSummary, ExcelRow, IssueReason, ProductField, RowIssues,
    ValidatedRow,
};

use super::error::ImportError;
use super::excel_reader::SpreadsheetUpload;
use super::field_normalizer::is_number;
use super::flavor_validator::{CategoryFlavorCheck, FlavorValidator};
use crate::shared::catalog_cache::CatalogCache;
use crate::shared::gateway::InventoryGateway;

/// Проверка всех строк файла: категория + вкусы + заполненность.
/// Делит строки на полные (Complete) и требующие ручной правки (Incomplete).
pub struct GeneralValidator {
    flavors: FlavorValidator,
    cache: Arc<CatalogCache>,
    required_fields: Vec<ProductField>,
}

impl GeneralValidator {
    pub fn new(gateway: Arc<dyn InventoryGateway>, require_image_url: bool) -> Self {
        let cache = Arc::new(CatalogCache::new());
        Self {
            flavors: FlavorValidator::new(gateway, cache.clone()),
            cache,
            required_fields: ProductField::required(require_image_url),
        }
    }

    pub fn flavor_validator(&self) -> &FlavorValidator {
        &self.flavors
    }

    pub fn required_fields(&self) -> &[ProductField] {
        &self.required_fields
    }

    /// Сбросить все кэши каталога этого экземпляра
    pub fn clear_caches(&self) {
        self.cache.invalidate_all();
        tracing::info!("Catalog caches cleared");
    }

    /// Пустые обязательные поля. Пусто = нет значения или одни пробелы; "0" не пусто.
    pub fn validate_row_completeness(&self, row: &ExcelRow) -> Vec<ProductField> {
        row.empty_fields(&self.required_fields)
    }

    /// Проверка шаблона: файл не пустой и все обязательные заголовки на месте
    pub fn check_structure(&self, upload: &SpreadsheetUpload) -> Result<(), ImportError> {
        if upload.rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        let missing: Vec<String> = self
            .required_fields
            .iter()
            .map(|f| f.header())
            .filter(|h| !upload.headers.iter().any(|found| found == h))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::Structure { missing });
        }
        Ok(())
    }

    /// Проверка одной строки. Входная строка не меняется; в `row` результата
    /// Category/Flavor_Count заменены каноническими значениями или очищены.
    pub async fn validate_row(&self, input: &ExcelRow) -> Result<ValidatedRow, ImportError> {
        let check = self
            .flavors
            .validate_category_and_flavors(
                input.get(ProductField::Category),
                input.get(ProductField::FlavorCount),
            )
            .await?;

        let mut row = input.clone();
        let category_flavor_issue = match check {
            CategoryFlavorCheck::Valid {
                category,
                flavor_count,
                ..
            } => {
                row.set(ProductField::Category, Some(category));
                row.set(ProductField::FlavorCount, Some(flavor_count.to_string()));
                None
            }
            CategoryFlavorCheck::Invalid {
                issue,
                canonical_category,
            } => {
                // без распознанной категории количество вкусов проверить нельзя - чистим оба поля
                let category_failed = matches!(
                    issue.reason,
                    IssueReason::EmptyCategory | IssueReason::CategoryNotFound
                );
                if category_failed {
                    row.set(ProductField::Category, None);
                } else if let Some(name) = canonical_category {
                    row.set(ProductField::Category, Some(name));
                }
                row.set(ProductField::FlavorCount, None);
                Some(issue)
            }
        };

        // нечисловое значение очищается и уходит в ручную правку, а не записывается как 0
        let mut invalid_numbers = Vec::new();
        for field in ProductField::NUMERIC {
            if row.trimmed(field).is_some_and(|v| !is_number(v)) {
                row.set(field, None);
                invalid_numbers.push(field);
            }
        }

        let empty_fields = self.validate_row_completeness(&row);
        let issues = RowIssues {
            empty_fields,
            invalid_numbers,
            category_flavor_issue,
        };

        Ok(ValidatedRow {
            row_number: input.row_number,
            original_row: input.clone(),
            row,
            issues: if issues.is_empty() { None } else { Some(issues) },
        })
    }

    /// Проверка всего файла. Строки обрабатываются строго по порядку.
    pub async fn validate_excel_data(
        &self,
        upload: &SpreadsheetUpload,
    ) -> Result<ClassificationResult, ImportError> {
        self.check_structure(upload)?;

        let mut complete_rows = Vec::new();
        let mut incomplete_rows = Vec::new();

        for input in &upload.rows {
            let validated = self.validate_row(input).await?;
            if validated.is_complete() {
                complete_rows.push(validated);
            } else {
                tracing::debug!(
                    "Row {} incomplete: {:?}",
                    validated.row_number,
                    validated.issues
                );
                incomplete_rows.push(validated);
            }
        }

        let categories_with_flavors = self.flavors.get_flavors_summary().await?;
        let summary = ClassificationSummary {
            total_rows: upload.rows.len(),
            complete_rows: complete_rows.len(),
            incomplete_rows: incomplete_rows.len(),
        };

        tracing::info!(
            "Classification finished: total={}, complete={}, incomplete={}",
            summary.total_rows,
            summary.complete_rows,
            summary.incomplete_rows
        );

        Ok(ClassificationResult {
            complete_rows,
            incomplete_rows,
            categories_with_flavors: categories_with_flavors.as_ref().clone(),
            summary,
        })
    }
}
