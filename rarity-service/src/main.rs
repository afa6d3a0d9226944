use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rarity_service::config::Settings;
use rarity_service::services::source::ReqwestSource;
use rarity_service::{build_router, AppState};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rarity_service=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let source = match ReqwestSource::new(settings.http_timeout) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to initialise HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let addr = format!("0.0.0.0:{}", settings.port);
    let app = build_router(AppState::new(Arc::new(source), settings));

    info!("Rarity service starting on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
