//! Choretender sync server
//!
//! Tracks shared household chores per sync identifier: who last tended
//! what and when. Each sync identifier owns one self-contained document
//! (tenders, chores, tending history) stored whole in SQLite.
//!
//! # Configuration
//!
//! Environment variables:
//! - `CHORETENDER_PORT`: Port to listen on (default: 8080)
//! - `CHORETENDER_DATABASE_PATH`: SQLite file (default: ~/.local/share/choretender/choretender.db)
//! - `CHORETENDER_CONFIG`: Path to config file (default: ~/.config/choretender/config.yaml)

mod config;
mod db;
mod models;
mod ops;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use db::{init_db, InstanceStore};
use ops::InstanceService;
use server::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "choretender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Database: {}", config.database_path.display());

    // A store we cannot open or migrate is a fatal condition: refuse to
    // serve rather than run against it.
    let pool = match init_db(config.database_path.clone()).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        service: Arc::new(InstanceService::new(InstanceStore::new(pool))),
    };
    let app = server::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
