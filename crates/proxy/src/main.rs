mod backend;
mod cli;
mod config;
mod error;
mod http;
mod logging;
#[cfg(test)]
mod test_utils;

use crate::backend::build_backend;
use crate::cli::Args;
use crate::config::load_proxy_config;
use crate::http::{router, AppState};
use crate::logging::init_tracing;
use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.log_to_stderr)?;

    let config = load_proxy_config(args.config.as_deref())?;
    let listen_addr = args
        .listen_addr
        .clone()
        .unwrap_or_else(|| config.listen_addr.clone());
    let backend = build_backend(&config.backend, |key| std::env::var(key).ok())
        .context("failed to initialize report backend")?;
    info!(
        listen_addr = %listen_addr,
        backend = backend.name(),
        cors = config.cors,
        "proxy starting"
    );

    let app = router(AppState::new(backend), config.cors);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    info!(addr = %listen_addr, "proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;
    info!("proxy shutting down");
    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
