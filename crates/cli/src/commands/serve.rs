use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::commands::open_project;
use crate::server::{router, AppState};

/// Serve the HTTP API until interrupted.
pub fn serve_command(root: &str, bind: Option<String>) -> Result<()> {
    let ctx = open_project(root)?;
    let bind = bind.unwrap_or_else(|| ctx.config.server.bind.clone());
    let extractor = Arc::from(ctx.extractor());
    let state = AppState::new(ctx.store, extractor, ctx.config.compare);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .with_context(|| format!("Failed to bind {bind}"))?;
        let addr = listener.local_addr().context("Failed to read bound address")?;
        info!(%addr, "serving discrepancy checker API");
        println!("Listening on http://{addr}");

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")
    })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
