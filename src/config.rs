use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "COFFEE_CONFIG";
pub const DB_ENV: &str = "COFFEE_DB";
pub const BIND_ENV: &str = "COFFEE_BIND";
pub const EXPORT_ENV: &str = "COFFEE_EXPORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite ledger file
    pub database_path: PathBuf,

    /// Address the web server listens on
    pub bind_addr: String,

    /// Default target for `coffee-payer export`
    pub export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("coffee.db"),
            bind_addr: "127.0.0.1:3000".into(),
            export_path: PathBuf::from("spendings.csv"),
        }
    }
}

impl Config {
    /// Defaults, then the JSON file named by `COFFEE_CONFIG` (if set), then env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path.as_ref()))
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(db) = lookup(DB_ENV) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(bind) = lookup(BIND_ENV) {
            self.bind_addr = bind;
        }
        if let Some(export) = lookup(EXPORT_ENV) {
            self.export_path = PathBuf::from(export);
        }
    }
}
