use contracts::usecases::u508_import_products_excel::{ImportErrorKind, RowIssues};
use thiserror::Error;

use crate::shared::gateway::GatewayError;

/// Ошибки, останавливающие импорт целиком
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Cannot read file: {0}")]
    Parse(String),

    #[error("File has no data rows")]
    EmptyFile,

    #[error("Missing required columns: {}", missing.join(", "))]
    Structure { missing: Vec<String> },

    #[error("Catalog unavailable: {0}")]
    CatalogFetch(#[source] GatewayError),

    #[error("Category catalog is empty")]
    EmptyCatalog,

    #[error("Category '{name}' not found in flavor catalog")]
    CategoryNotFound { name: String, available: Vec<String> },

    #[error("Commit failed: {0}")]
    Commit(#[source] GatewayError),

    #[error("Invalid import mode '{0}' (expected replace or upsert)")]
    InvalidImportMode(String),

    #[error("Correction session not found: {0}")]
    SessionNotFound(String),
}

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::Parse(_) => ImportErrorKind::Parse,
            ImportError::EmptyFile | ImportError::Structure { .. } => ImportErrorKind::Structure,
            ImportError::CatalogFetch(_)
            | ImportError::EmptyCatalog
            | ImportError::CategoryNotFound { .. } => ImportErrorKind::CatalogFetch,
            ImportError::Commit(_) => ImportErrorKind::Commit,
            ImportError::InvalidImportMode(_) | ImportError::SessionNotFound(_) => {
                ImportErrorKind::InvalidInput
            }
        }
    }
}

/// Ошибки операций в сессии ручной корректировки
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("Row index {0} is out of range")]
    RowOutOfRange(usize),

    #[error("Row {row_number} (index {index}) was deleted")]
    RowDeleted { index: usize, row_number: usize },

    #[error("Field {field} of row {row_number} is read-only")]
    FieldNotEditable { field: String, row_number: usize },

    #[error("Row {row_number} (index {index}) still has problems")]
    CommitBlocked {
        index: usize,
        row_number: usize,
        issues: RowIssues,
    },

    #[error("Nothing to commit: all rows were deleted")]
    NothingToCommit,

    #[error(transparent)]
    Import(#[from] ImportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_message_lists_columns() {
        let err = ImportError::Structure {
            missing: vec!["Code".into(), "Flavor_Count".into()],
        };
        assert_eq!(err.to_string(), "Missing required columns: Code, Flavor_Count");
        assert_eq!(err.kind(), ImportErrorKind::Structure);
    }

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(ImportError::EmptyFile.kind(), ImportErrorKind::Structure);
        assert_eq!(
            ImportError::Parse("bad".into()).kind(),
            ImportErrorKind::Parse
        );
        assert_eq!(
            ImportError::CatalogFetch(GatewayError::Transport("down".into())).kind(),
            ImportErrorKind::CatalogFetch
        );
        assert_eq!(
            ImportError::Commit(GatewayError::Status {
                status: 500,
                body: String::new()
            })
            .kind(),
            ImportErrorKind::Commit
        );
    }
}
