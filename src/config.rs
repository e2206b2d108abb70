//! Configuration du serveur, lue depuis l'environnement (et le fichier `.env`).
//!
//! - `PORT`: port d'écoute HTTP
//! - `DATABASE_URL`: chemin de la sauvegarde YAML du stockage, ou `memory:`
//!   pour un stockage volatil

use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};

use crate::consts::{DEFAULT_DATABASE_URL, DEFAULT_HTTP_PORT, MEMORY_DATABASE_URL};
use crate::database::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        if url.eq_ignore_ascii_case(MEMORY_DATABASE_URL) {
            return StoreLocation::Memory;
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        if path.is_empty() {
            StoreLocation::File(PathBuf::from(DEFAULT_DATABASE_URL))
        } else {
            StoreLocation::File(PathBuf::from(path))
        }
    }

    pub async fn open(&self) -> Result<Store> {
        match self {
            StoreLocation::Memory => Ok(Store::in_memory()),
            StoreLocation::File(path) => Store::open(path)
                .await
                .with_context(|| format!("Failed to open the record store at {}", path.display())),
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::Memory => write!(f, "in memory"),
            StoreLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store: StoreLocation,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a TCP port number, got {raw:?}"))?,
            None => DEFAULT_HTTP_PORT,
        };

        let store = lookup("DATABASE_URL")
            .map(|url| StoreLocation::parse(&url))
            .unwrap_or_else(|| StoreLocation::File(PathBuf::from(DEFAULT_DATABASE_URL)));

        Ok(Self { port, store })
    }
}
