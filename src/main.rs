//! Point d'entrée principal de l'application.
//! Charge la configuration, ouvre le stockage, initialise les lits
//! et démarre le serveur web avec Axum.

mod backend;
mod bootstrap;
mod config;
mod consts;
mod database;
mod models;
mod services;
mod utils;

use std::net::SocketAddr;
use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{error, info};
use crate::{config::Config, services::WardService};

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::from_env()?;

    // Ouvrir le stockage puis l'initialiser (lits, compte admin)
    let store = config.store.open().await?;
    info!("Record store ready ({})", config.store);
    bootstrap::initialize(&store).await;

    let app = backend::router::get_router(WardService::new(store.clone()));

    // Démarrer le serveur web
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to open web server listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to bind Axum to listener")?;

    // Sauvegarde finale du stockage
    if let Err(e) = store.flush().await {
        error!("Failed to flush the record store: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
