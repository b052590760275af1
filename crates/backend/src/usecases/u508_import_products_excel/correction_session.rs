use std::collections::{BTreeMap, BTreeSet, HashMap};

use contracts::domain::a026_category::FlavorSummary;
use contracts::enums::import_mode::ImportMode;
use contracts::usecases::u508_import_products_excel::{
    ClassificationResult, CorrectionRowView, CorrectionSessionView, ExcelRow, NavigateDirection,
    ProductField, ValidatedRow,
};

use super::category_validator::catalog_key;
use super::error::CorrectionError;
use super::general_validator::GeneralValidator;

/// Сессия ручной корректировки неполных строк.
///
/// Правки хранятся по индексу в списке неполных строк, не по номеру строки файла.
/// Режим импорта фиксируется при создании и дальше не перечитывается.
pub struct CorrectionSession {
    id: String,
    import_mode: ImportMode,
    complete_rows: Vec<ValidatedRow>,
    incomplete_rows: Vec<ValidatedRow>,
    categories_with_flavors: Vec<FlavorSummary>,
    required_fields: Vec<ProductField>,
    edits: HashMap<usize, BTreeMap<ProductField, String>>,
    deleted_rows: BTreeSet<usize>,
}

impl CorrectionSession {
    pub fn new(
        id: String,
        import_mode: ImportMode,
        result: ClassificationResult,
        required_fields: Vec<ProductField>,
    ) -> Self {
        Self {
            id,
            import_mode,
            complete_rows: result.complete_rows,
            incomplete_rows: result.incomplete_rows,
            categories_with_flavors: result.categories_with_flavors,
            required_fields,
            edits: HashMap::new(),
            deleted_rows: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn import_mode(&self) -> ImportMode {
        self.import_mode
    }

    /// Неполные строки минус удалённые
    pub fn available_indices(&self) -> Vec<usize> {
        (0..self.incomplete_rows.len())
            .filter(|i| !self.deleted_rows.contains(i))
            .collect()
    }

    fn row_at(&self, index: usize) -> Result<&ValidatedRow, CorrectionError> {
        let row = self
            .incomplete_rows
            .get(index)
            .ok_or(CorrectionError::RowOutOfRange(index))?;
        if self.deleted_rows.contains(&index) {
            return Err(CorrectionError::RowDeleted {
                index,
                row_number: row.row_number,
            });
        }
        Ok(row)
    }

    /// Редактируются только поля, пустые на момент классификации
    pub fn editable_fields(&self, index: usize) -> Result<Vec<ProductField>, CorrectionError> {
        Ok(self.row_at(index)?.row.empty_fields(&self.required_fields))
    }

    /// Проверенное представление строки с наложенными правками
    pub fn current_values(&self, index: usize) -> Result<ExcelRow, CorrectionError> {
        let mut values = self.row_at(index)?.row.clone();
        if let Some(edits) = self.edits.get(&index) {
            for (field, value) in edits {
                values.set(*field, Some(value.clone()));
            }
        }
        Ok(values)
    }

    pub fn set_field(
        &mut self,
        index: usize,
        field: ProductField,
        value: String,
    ) -> Result<(), CorrectionError> {
        let row_number = self.row_at(index)?.row_number;
        let editable = self.editable_fields(index)?;
        if !editable.contains(&field) {
            return Err(CorrectionError::FieldNotEditable {
                field: field.to_string(),
                row_number,
            });
        }

        // категория без активных вкусов: количество вкусов может быть только 0
        let reset_flavors = field == ProductField::Category
            && editable.contains(&ProductField::FlavorCount)
            && self
                .flavor_summary(&value)
                .is_some_and(|s| s.max_flavors == 0);

        let row_edits = self.edits.entry(index).or_default();
        row_edits.insert(field, value);
        if reset_flavors {
            row_edits.insert(ProductField::FlavorCount, "0".to_string());
        }
        Ok(())
    }

    fn flavor_summary(&self, category: &str) -> Option<&FlavorSummary> {
        let key = catalog_key(category);
        self.categories_with_flavors
            .iter()
            .find(|s| catalog_key(&s.name) == key)
    }

    /// Удаление без возможности отмены
    pub fn delete_row(&mut self, index: usize) -> Result<(), CorrectionError> {
        let row_number = self.row_at(index)?.row_number;
        self.deleted_rows.insert(index);
        self.edits.remove(&index);
        tracing::info!("Session {}: row {} deleted", self.id, row_number);
        Ok(())
    }

    pub fn first_available(&self) -> Option<usize> {
        self.available_indices().first().copied()
    }

    /// Соседняя неудалённая строка; на краях списка - `None`
    pub fn navigate(&self, from: usize, direction: NavigateDirection) -> Option<usize> {
        let available = self.available_indices();
        match direction {
            NavigateDirection::Next => available.into_iter().find(|&i| i > from),
            NavigateDirection::Prev => available.into_iter().rev().find(|&i| i < from),
        }
    }

    /// Обязательные поля, всё ещё пустые после правок
    pub fn pending_empty_fields(&self, index: usize) -> Result<Vec<ProductField>, CorrectionError> {
        Ok(self
            .current_values(index)?
            .empty_fields(&self.required_fields))
    }

    pub fn row_view(&self, index: usize) -> Result<CorrectionRowView, CorrectionError> {
        let row = self.row_at(index)?;
        Ok(CorrectionRowView {
            index,
            row_number: row.row_number,
            values: self.current_values(index)?,
            editable_fields: self.editable_fields(index)?,
            issues: row.issues.clone(),
            edited: self.edits.get(&index).is_some_and(|e| !e.is_empty()),
        })
    }

    pub fn view(&self) -> Result<CorrectionSessionView, CorrectionError> {
        let available = self.available_indices();
        let rows = available
            .iter()
            .map(|&i| self.row_view(i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorrectionSessionView {
            session_id: self.id.clone(),
            import_mode: self.import_mode,
            complete_count: self.complete_rows.len(),
            incomplete_count: self.incomplete_rows.len(),
            deleted_count: self.deleted_rows.len(),
            available_count: available.len(),
            rows,
            categories_with_flavors: self.categories_with_flavors.clone(),
        })
    }

    /// Итоговый набор строк для записи: полные ∪ исправленные неудалённые,
    /// по номеру строки. Каждая исправленная строка проходит те же проверки,
    /// что и при автоматической классификации; первая проблемная блокирует запись.
    pub async fn finalize(
        &self,
        validator: &GeneralValidator,
    ) -> Result<Vec<ExcelRow>, CorrectionError> {
        let mut rows: Vec<ExcelRow> = self.complete_rows.iter().map(|r| r.row.clone()).collect();

        for index in self.available_indices() {
            let values = self.current_values(index)?;
            let validated = validator.validate_row(&values).await?;
            if let Some(issues) = validated.issues {
                return Err(CorrectionError::CommitBlocked {
                    index,
                    row_number: validated.row_number,
                    issues,
                });
            }
            rows.push(validated.row);
        }

        if rows.is_empty() {
            return Err(CorrectionError::NothingToCommit);
        }

        rows.sort_by_key(|r| r.row_number);
        Ok(rows)
    }
}
