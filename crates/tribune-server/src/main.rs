mod config;

use anyhow::Context;
use tracing::{info, warn};

use tribune_api::auth;
use tribune_db::Database;
use tribune_gateway::Server;

use crate::config::ServerConfig;

const DEFAULT_LOG_FILTER: &str = "tribune_server=debug,tribune_gateway=debug,tribune_api=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let server = Server::new(Database::new(), config.gateway);

    match &config.admin {
        Some(admin) => {
            auth::seed_admin(server.state(), &admin.username, &admin.password, &admin.nickname)
                .with_context(|| format!("seeding administrator {}", admin.username))?;
        }
        None => warn!("No TRIBUNE_ADMIN_USER configured: moderation is unavailable"),
    }

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    info!("Tribune forum server listening on {}", config.addr);

    tokio::select! {
        _ = server.run(listener) => {}
        _ = shutdown_signal() => {}
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable ({}), waiting for Ctrl+C", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
