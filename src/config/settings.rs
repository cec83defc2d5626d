//! Application settings loading from config.toml and the environment.
//!
//! Presentation-level knobs (the category list, how many upcoming bills and
//! recent wallet entries to show) live in an optional `config.toml`; the
//! database URL comes from the environment. Everything has a default so the
//! crate works with no configuration at all.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Connection string for the backing store
    pub database_url: String,
    /// Expense categories offered to the user
    pub categories: Vec<String>,
    /// How many upcoming bills dashboards list
    pub upcoming_limit: usize,
    /// How many recent wallet entries the wallet view fetches
    pub wallet_recent_limit: u64,
}

/// Shape of the optional `config.toml` file. All fields are optional and
/// fall back to the built-in defaults.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    categories: Option<Vec<String>>,
    upcoming_limit: Option<usize>,
    wallet_recent_limit: Option<u64>,
}

/// The category set shipped by default.
pub fn default_categories() -> Vec<String> {
    [
        "Moradia",
        "Contas",
        "Assinaturas",
        "Transporte",
        "Saúde",
        crate::entities::expense::DEFAULT_CATEGORY,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Loads the application configuration: `.env` (non-fatal), then the
/// environment, then `./config.toml` when present.
pub fn load_app_configuration() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let file = if Path::new("config.toml").exists() {
        load_file_config("config.toml")?
    } else {
        FileConfig::default()
    };

    Ok(AppConfig {
        database_url: crate::config::database::get_database_url(),
        categories: file.categories.unwrap_or_else(default_categories),
        upcoming_limit: file.upcoming_limit.unwrap_or(6),
        wallet_recent_limit: file.wallet_recent_limit.unwrap_or(30),
    })
}

fn load_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path.as_ref())?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}
