//! Configuration management for the server.

use obsidian_engine::LoadOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Table holding the canonical buyer rows
    pub buyers_table: String,
    /// Local JSON export used for sync and as the read fallback
    pub local_snapshot_path: PathBuf,
    /// How long a loaded snapshot is served before reloading
    pub snapshot_ttl: Duration,
    /// Derive ids for local rows that arrive without one
    pub derive_missing_ids: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = get("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = get("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;

        let buyers_table = get("BUYERS_TABLE").unwrap_or_else(|| "buyers".to_string());
        if !is_identifier(&buyers_table) {
            return Err(ConfigError::InvalidTable(buyers_table));
        }

        let local_snapshot_path = get("LOCAL_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("combined_buyers.json"));

        let snapshot_ttl = get("SNAPSHOT_TTL_SECS")
            .unwrap_or_else(|| "300".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTtl)?;

        let derive_missing_ids = match get("DERIVE_MISSING_IDS") {
            None => false,
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "DERIVE_MISSING_IDS",
                value: raw,
            })?,
        };

        Ok(Self {
            host,
            port,
            database_url,
            buyers_table,
            local_snapshot_path,
            snapshot_ttl,
            derive_missing_ids,
        })
    }

    /// Options for loading the local snapshot.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            derive_missing_ids: self.derive_missing_ids,
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    starts_ok && name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("BUYERS_TABLE must be a plain SQL identifier, got '{0}'")]
    InvalidTable(String),

    #[error("Invalid SNAPSHOT_TTL_SECS value")]
    InvalidTtl,

    #[error("Invalid boolean for {name}: '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/obsidian")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.buyers_table, "buyers");
        assert_eq!(config.local_snapshot_path, PathBuf::from("combined_buyers.json"));
        assert_eq!(config.snapshot_ttl, Duration::from_secs(300));
        assert!(!config.load_options().derive_missing_ids);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/obsidian"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("BUYERS_TABLE", "buyers_2024"),
            ("LOCAL_SNAPSHOT_PATH", "/data/export.json"),
            ("SNAPSHOT_TTL_SECS", "0"),
            ("DERIVE_MISSING_IDS", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.buyers_table, "buyers_2024");
        assert_eq!(config.local_snapshot_path, PathBuf::from("/data/export.json"));
        assert_eq!(config.snapshot_ttl, Duration::ZERO);
        assert!(config.derive_missing_ids);
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn invalid_values() {
        let url = ("DATABASE_URL", "postgres://localhost/obsidian");

        assert!(matches!(
            config_from(&[url, ("PORT", "http")]),
            Err(ConfigError::InvalidPort)
        ));
        assert!(matches!(
            config_from(&[url, ("BUYERS_TABLE", "buyers; drop table x")]),
            Err(ConfigError::InvalidTable(_))
        ));
        assert!(matches!(
            config_from(&[url, ("SNAPSHOT_TTL_SECS", "-5")]),
            Err(ConfigError::InvalidTtl)
        ));
        assert!(matches!(
            config_from(&[url, ("DERIVE_MISSING_IDS", "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("buyers"));
        assert!(is_identifier("_staging_buyers2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2buyers"));
        assert!(!is_identifier("public.buyers"));
        assert!(!is_identifier("buyers\""));
        assert!(!is_identifier(&"b".repeat(64)));
    }
}
