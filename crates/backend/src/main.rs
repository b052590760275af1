pub mod api;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use std::sync::Arc;
use std::time::Duration;

use crate::shared::gateway::HttpInventoryGateway;
use crate::usecases::u508_import_products_excel::{ImportExecutor, ProgressTracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use axum::middleware;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    system::tracing::initialize()?;

    let config = shared::config::load_config()?;
    tracing::info!(
        "Inventory store: {} (timeout {}s), require_image_url={}",
        config.gateway.base_url,
        config.gateway.timeout_secs,
        config.import.require_image_url
    );

    let gateway = Arc::new(HttpInventoryGateway::new(&config.gateway)?);
    let tracker = Arc::new(ProgressTracker::new());
    let executor = Arc::new(ImportExecutor::new(gateway, &config.import, tracker));
    api::handlers::u508_import_products::init_executor(executor.clone())?;

    // Периодическая очистка завершённых сессий прогресса
    let retention_hours = config.import.progress_retention_hours;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            executor.cleanup(retention_hours);
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes()
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
