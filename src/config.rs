//! Configuration de l'application, lue une seule fois au démarrage
//! depuis l'environnement (et un éventuel fichier `.env`).

use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use crate::consts;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub data_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("AROGYA_HTTP_PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("Invalid AROGYA_HTTP_PORT: {port}"))?,
            Err(_) => consts::HTTP_PORT,
        };

        let data_dir = env::var("AROGYA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(consts::DATA_DIR));

        // Une clé vide équivaut à une clé absente
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let gemini_base_url =
            env::var("GEMINI_BASE_URL").unwrap_or_else(|_| consts::GEMINI_BASE_URL.to_string());

        Ok(Self {
            http_port,
            data_dir,
            gemini_api_key,
            gemini_base_url,
        })
    }
}
