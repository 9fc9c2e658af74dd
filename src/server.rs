// Passive static file server for hosted deployments: the platform health
// checks the bound port, and dashboard.html gets served as a side effect.
// Shares no state with the scrape loop.
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub async fn run(port: u16) {
    let app = Router::new().fallback_service(ServeDir::new("."));

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!("Could not bind dashboard server on port {}: {}", port, e);
            return;
        }
    };

    info!("Dashboard server listening on port {}", port);
    if let Err(e) = axum::serve(listener, app).await {
        warn!("Dashboard server stopped: {}", e);
    }
}
