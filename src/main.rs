//! Point d'entrée principal de l'application.
//! Charge la configuration, ouvre le stockage, prépare la passerelle IA
//! et démarre le serveur web avec Axum.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use dotenv::dotenv;
use log::{info, warn};

use arogya_mitra::{
    backend::{router::get_router, AppState},
    config::Config,
    database::Store,
    gateway::{AiGateway, GeminiClient},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Charger les variables d'environnement
    dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::from_env()?;

    let store = Store::open(&config.data_dir)
        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
    info!("Health data stored in {}", store.root().display());

    // Sans clé, le service démarre quand même: chaque appel IA signale l'erreur
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, AI features will report a configuration error");
    }
    let client = GeminiClient::new(&config.gemini_base_url, config.gemini_api_key.clone())
        .context("Invalid GEMINI_BASE_URL")?;
    let ai = AiGateway::new(Arc::new(client));

    let app = get_router(Arc::new(AppState { store, ai }));

    // Démarrer le serveur web
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to open web server listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("Failed to bind Axum to listener")
}
