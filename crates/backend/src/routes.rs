use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::u508_import_products as u508;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // UseCase u508: Import products from Excel
        // ========================================
        .route("/api/u508/import/excel", post(u508::import_excel))
        .route("/api/u508/import/csv", post(u508::import_csv))
        .route(
            "/api/u508/import/mode",
            get(u508::get_import_mode).put(u508::set_import_mode),
        )
        .route(
            "/api/u508/import/:session_id/progress",
            get(u508::get_progress),
        )
        // Manual correction session
        .route(
            "/api/u508/correction/:session_id",
            get(u508::get_correction).delete(u508::cancel_correction),
        )
        .route(
            "/api/u508/correction/:session_id/rows/:index",
            get(u508::get_correction_row)
                .put(u508::edit_correction_row)
                .delete(u508::delete_correction_row),
        )
        .route(
            "/api/u508/correction/:session_id/rows/:index/navigate",
            get(u508::navigate_correction),
        )
        .route(
            "/api/u508/correction/:session_id/commit",
            post(u508::commit_correction),
        )
        // Category / flavor catalog
        .route(
            "/api/u508/catalog/flavors-summary",
            get(u508::get_flavors_summary),
        )
        .route("/api/u508/catalog/refresh", post(u508::refresh_catalog))
}

