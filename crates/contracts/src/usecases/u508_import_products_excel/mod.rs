pub mod excel;
pub mod progress;
pub mod request;
pub mod response;
pub mod validation;

pub use excel::{ExcelData, ExcelMetadata, ExcelRow, ProductField, FIRST_DATA_ROW_NUMBER};
pub use progress::{ImportProgress, ImportState};
pub use request::{EditFieldRequest, ImportModeResponse, NavigateDirection, SetImportModeRequest};
pub use response::{
    CorrectionRowView, CorrectionSessionView, ImportErrorKind, ImportResponse, UpsertAction,
    UpsertDetail, UpsertSummary,
};
pub use validation::{
    CategoryFlavorIssue, ClassificationResult, ClassificationSummary, IssueReason, RowIssues,
    ValidatedRow,
};
