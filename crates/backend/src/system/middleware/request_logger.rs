use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::shared::format::format_number;

/// Размер тела из Content-Length (тело ответа не буферизуем: импорт может вернуть большой JSON)
fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Middleware для логирования HTTP запросов: метод, путь, статус,
/// длительность и размер ответа
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status();
    let size = content_length(response.headers())
        .map(format_number)
        .unwrap_or_else(|| "-".to_string());
    let elapsed_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!("{} {} -> {} | {}ms | {}", method, path, status.as_u16(), elapsed_ms, size);
    } else if status.is_client_error() {
        tracing::warn!("{} {} -> {} | {}ms | {}", method, path, status.as_u16(), elapsed_ms, size);
    } else {
        tracing::info!("{} {} -> {} | {}ms | {}", method, path, status.as_u16(), elapsed_ms, size);
    }

    response
}
