use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::api::DEFAULT_API_BASE_URL;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://exrates.db";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_TRACKED: [&str; 4] = ["EUR", "USD", "RUB", "CNY"];

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub api_base_url: String,
    /// Currencies the `report` command checks for limit breaches.
    pub tracked: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    tracked: Vec<String>,
}

impl Config {
    /// Environment supplies the store URL and API base; `config.toml` in the
    /// working directory (optional) supplies the tracked-currency list.
    pub fn load() -> anyhow::Result<Config> {
        let file = match fs::read_to_string(Path::new(CONFIG_FILE)) {
            Ok(raw) => toml::from_str::<FileConfig>(&raw)?,
            Err(_) => FileConfig::default(),
        };

        let tracked = if file.tracked.is_empty() {
            DEFAULT_TRACKED.iter().map(|s| s.to_string()).collect()
        } else {
            file.tracked
        };

        Ok(Config {
            database_url: env::var("EXRATES_DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            api_base_url: env::var("EXRATES_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            tracked,
        })
    }
}
