//! A small polling site: voters browse published questions and vote on their
//! choices, staff manage questions through the admin pages.
//!
//! Data lives in Postgres when `DATABASE_URL` is set and in process memory
//! otherwise.
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use tokio::signal::ctrl_c;
use tracing::{error, info};

pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod query;
pub mod render;
pub mod routes;
pub mod state;
pub mod store;

use admin::AdminSite;
use config::Config;
use db::PgStore;
use memory::MemoryStore;
use state::AppState;
use store::Store;

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    info!("Initializing state...");
    match config.database_url.clone() {
        Some(database_url) => {
            let store = PgStore::connect(&config, &database_url)
                .await
                .context("Failed to connect to the database")?;
            serve(config, store).await
        }
        None => serve(config, MemoryStore::new()).await,
    }
}

async fn serve<S: Store>(config: Config, store: S) -> anyhow::Result<()> {
    let mut state = AppState::new(store);
    if config.admin_enabled {
        info!("Admin pages enabled");
        state = state.with_admin(AdminSite::default());
    }
    let app = routes::create_routes(state);

    let address = config.address();
    info!("Binding to {address}");
    let socket = tokio::net::lookup_host(&address)
        .await?
        .next()
        .with_context(|| format!("No socket address for {address}"))?;

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), config.shutdown_grace));

    info!("Server running on {socket}");
    axum_server::bind(socket)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal(handle: Handle, grace: Duration) {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    handle.graceful_shutdown(Some(grace));
}
