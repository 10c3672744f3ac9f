/// Axum HTTP server setup and routing

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::script::Script;

pub fn create_router(script: Arc<Script>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // JSON-RPC endpoint, reachable at both / and /rpc
        .route("/", post(handle_rpc))
        .route("/rpc", post(handle_rpc))
        .route("/friendbot", get(friendbot))
        .route("/health", get(health_check))
        .with_state(script)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(script: Arc<Script>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(script);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Soroban RPC mock listening on http://{}", addr);
    log::info!("📡 JSON-RPC endpoint: POST /rpc");
    log::info!("💰 Friendbot endpoint: GET /friendbot?addr=");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve on an ephemeral local port in the background
pub async fn spawn(script: Arc<Script>) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(script);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("❌ Mock server stopped: {}", e);
        }
    });

    Ok(addr)
}
