use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use contracts::domain::a026_category::FlavorSummary;
use contracts::enums::import_mode::ImportMode;
use contracts::usecases::u508_import_products_excel::{
    CorrectionRowView, CorrectionSessionView, EditFieldRequest, ImportErrorKind,
    ImportModeResponse, ImportProgress, ImportResponse, NavigateDirection, SetImportModeRequest,
};

use crate::usecases::u508_import_products_excel::{CorrectionError, ImportError, ImportExecutor};

type ApiError = (StatusCode, Json<serde_json::Value>);

static IMPORT_EXECUTOR: OnceCell<Arc<ImportExecutor>> = OnceCell::new();

/// Регистрация executor'а при старте сервера
pub fn init_executor(executor: Arc<ImportExecutor>) -> anyhow::Result<()> {
    IMPORT_EXECUTOR
        .set(executor)
        .map_err(|_| anyhow::anyhow!("u508 import executor already initialized"))
}

fn executor() -> Result<&'static Arc<ImportExecutor>, ApiError> {
    IMPORT_EXECUTOR.get().ok_or_else(|| {
        tracing::error!("u508 import executor is not initialized");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "import service is not initialized"})),
        )
    })
}

fn import_error_status(error: &ImportError) -> StatusCode {
    match error {
        ImportError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        other => kind_status(other.kind()),
    }
}

fn kind_status(kind: ImportErrorKind) -> StatusCode {
    match kind {
        ImportErrorKind::Parse | ImportErrorKind::Structure | ImportErrorKind::InvalidInput => {
            StatusCode::BAD_REQUEST
        }
        ImportErrorKind::CatalogFetch | ImportErrorKind::Commit => StatusCode::BAD_GATEWAY,
    }
}

fn import_error(error: ImportError) -> ApiError {
    let status = import_error_status(&error);
    tracing::error!("u508 request failed ({}): {}", status, error);
    (
        status,
        Json(json!({"error": error.to_string(), "kind": error.kind()})),
    )
}

fn correction_error(error: CorrectionError) -> ApiError {
    let (status, body) = match &error {
        CorrectionError::Import(inner) => return import_error_from_ref(inner, &error),
        CorrectionError::RowOutOfRange(_) => {
            (StatusCode::NOT_FOUND, json!({"error": error.to_string()}))
        }
        CorrectionError::RowDeleted { index, .. } => (
            StatusCode::CONFLICT,
            json!({"error": error.to_string(), "index": index}),
        ),
        CorrectionError::FieldNotEditable { .. } => {
            (StatusCode::BAD_REQUEST, json!({"error": error.to_string()}))
        }
        CorrectionError::CommitBlocked {
            index,
            row_number,
            issues,
        } => (
            StatusCode::CONFLICT,
            json!({
                "error": error.to_string(),
                "index": index,
                "row_number": row_number,
                "issues": issues,
            }),
        ),
        CorrectionError::NothingToCommit => {
            (StatusCode::CONFLICT, json!({"error": error.to_string()}))
        }
    };
    tracing::warn!("u508 correction request rejected ({}): {}", status, error);
    (status, Json(body))
}

fn import_error_from_ref(inner: &ImportError, error: &CorrectionError) -> ApiError {
    let status = import_error_status(inner);
    tracing::error!("u508 correction request failed ({}): {}", status, error);
    (
        status,
        Json(json!({"error": error.to_string(), "kind": inner.kind()})),
    )
}

/// Ответ импорта отдаётся всегда; код статуса берётся из класса ошибки
fn import_response(response: ImportResponse) -> (StatusCode, Json<ImportResponse>) {
    let status = match response.error_kind {
        Some(kind) => kind_status(kind),
        None => StatusCode::OK,
    };
    (status, Json(response))
}

// ============================================================================
// Import
// ============================================================================

/// POST /api/u508/import/excel
pub async fn import_excel(body: Bytes) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let executor = executor()?;
    tracing::info!("Received Excel import request ({} bytes)", body.len());
    Ok(import_response(executor.import_excel_json(&body).await))
}

#[derive(Deserialize)]
pub struct CsvImportParams {
    pub file_name: Option<String>,
}

/// POST /api/u508/import/csv?file_name=...
pub async fn import_csv(
    Query(params): Query<CsvImportParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let executor = executor()?;
    tracing::info!(
        "Received CSV import request {:?} ({} bytes)",
        params.file_name,
        body.len()
    );
    Ok(import_response(
        executor.import_csv(&body, params.file_name).await,
    ))
}

/// GET /api/u508/import/mode
pub async fn get_import_mode() -> Result<Json<ImportModeResponse>, ApiError> {
    let executor = executor()?;
    Ok(Json(ImportModeResponse {
        mode: executor.import_mode(),
        available: ImportMode::all(),
    }))
}

/// PUT /api/u508/import/mode
pub async fn set_import_mode(
    Json(request): Json<SetImportModeRequest>,
) -> Result<Json<ImportModeResponse>, ApiError> {
    let executor = executor()?;
    let mode = executor.set_import_mode(&request.mode).map_err(import_error)?;
    Ok(Json(ImportModeResponse {
        mode,
        available: ImportMode::all(),
    }))
}

/// GET /api/u508/import/:session_id/progress
pub async fn get_progress(
    Path(session_id): Path<String>,
) -> Result<Json<ImportProgress>, ApiError> {
    let executor = executor()?;
    executor
        .get_progress(&session_id)
        .map(Json)
        .ok_or_else(|| import_error(ImportError::SessionNotFound(session_id)))
}

// ============================================================================
// Correction
// ============================================================================

/// GET /api/u508/correction/:session_id
pub async fn get_correction(
    Path(session_id): Path<String>,
) -> Result<Json<CorrectionSessionView>, ApiError> {
    let executor = executor()?;
    executor
        .session_view(&session_id)
        .await
        .map(Json)
        .map_err(correction_error)
}

/// GET /api/u508/correction/:session_id/rows/:index
pub async fn get_correction_row(
    Path((session_id, index)): Path<(String, usize)>,
) -> Result<Json<CorrectionRowView>, ApiError> {
    let executor = executor()?;
    executor
        .row_view(&session_id, index)
        .await
        .map(Json)
        .map_err(correction_error)
}

/// PUT /api/u508/correction/:session_id/rows/:index
pub async fn edit_correction_row(
    Path((session_id, index)): Path<(String, usize)>,
    Json(request): Json<EditFieldRequest>,
) -> Result<Json<CorrectionRowView>, ApiError> {
    let executor = executor()?;
    executor
        .edit_row(&session_id, index, request.field, request.value)
        .await
        .map(Json)
        .map_err(correction_error)
}

/// DELETE /api/u508/correction/:session_id/rows/:index
pub async fn delete_correction_row(
    Path((session_id, index)): Path<(String, usize)>,
) -> Result<Json<CorrectionSessionView>, ApiError> {
    let executor = executor()?;
    executor
        .delete_row(&session_id, index)
        .await
        .map(Json)
        .map_err(correction_error)
}

#[derive(Deserialize)]
pub struct NavigateParams {
    pub direction: NavigateDirection,
}

/// GET /api/u508/correction/:session_id/rows/:index/navigate?direction=next|prev
///
/// `null`, если дальше строк нет
pub async fn navigate_correction(
    Path((session_id, index)): Path<(String, usize)>,
    Query(params): Query<NavigateParams>,
) -> Result<Json<Option<CorrectionRowView>>, ApiError> {
    let executor = executor()?;
    executor
        .navigate(&session_id, index, params.direction)
        .await
        .map(Json)
        .map_err(correction_error)
}

/// POST /api/u508/correction/:session_id/commit
pub async fn commit_correction(
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let executor = executor()?;
    executor
        .commit_correction(&session_id)
        .await
        .map(import_response)
        .map_err(correction_error)
}

/// DELETE /api/u508/correction/:session_id
pub async fn cancel_correction(
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let executor = executor()?;
    executor
        .cancel_correction(&session_id)
        .await
        .map_err(import_error)?;
    Ok(Json(json!({"success": true})))
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/u508/catalog/flavors-summary
pub async fn get_flavors_summary() -> Result<Json<Vec<FlavorSummary>>, ApiError> {
    let executor = executor()?;
    executor
        .flavors_summary()
        .await
        .map(Json)
        .map_err(import_error)
}

/// POST /api/u508/catalog/refresh
pub async fn refresh_catalog() -> Result<Json<serde_json::Value>, ApiError> {
    let executor = executor()?;
    executor.refresh_catalog();
    Ok(Json(json!({"success": true})))
}
