//! Configuration management for the contract highlights server

use serde::Deserialize;
use std::env;

use crate::html::{AnchorPolicy, OverlapStrategy, NEUTRAL_COLOR};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the file backend
    pub path: String,
    /// Connection string for the sqlite backend
    pub database_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    None,
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub overlap: OverlapStrategy,
    pub anchor: AnchorPolicy,
    pub fallback_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                backend: StorageBackend::File,
                path: "./data/highlights".to_string(),
                database_url: "sqlite:./highlights.db".to_string(),
            },
            render: RenderConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            overlap: OverlapStrategy::Nest,
            anchor: AnchorPolicy::Trust,
            fallback_color: NEUTRAL_COLOR.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            storage: StorageConfig {
                backend: match env::var("STORAGE_BACKEND")
                    .unwrap_or_else(|_| "file".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "none" => StorageBackend::None,
                    "memory" => StorageBackend::Memory,
                    "sqlite" => StorageBackend::Sqlite,
                    _ => StorageBackend::File,
                },
                path: env::var("STORAGE_PATH").unwrap_or(defaults.storage.path),
                database_url: env::var("DATABASE_URL").unwrap_or(defaults.storage.database_url),
            },
            render: RenderConfig {
                overlap: env::var("RENDER_OVERLAP")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.render.overlap),
                anchor: env::var("RENDER_ANCHOR")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.render.anchor),
                fallback_color: env::var("RENDER_FALLBACK_COLOR")
                    .ok()
                    .filter(|c| crate::annotations::is_hex_color(c))
                    .unwrap_or(defaults.render.fallback_color),
            },
        }
    }
}
