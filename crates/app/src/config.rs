use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use services::StoreSettings;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid database url: {0}")]
    DatabaseUrl(String),
    #[error("failed to prepare database file {path}: {source}")]
    DatabaseFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Server settings read from `VOCAB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub db_url: String,
    pub catalog_dir: PathBuf,
    pub flush_interval: Duration,
    pub max_pending: usize,
}

impl Config {
    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a value that does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a value that does not parse, or a
    /// zero flush interval or journal size.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let flush_secs: u64 = try_load(&lookup, "VOCAB_FLUSH_INTERVAL_SECS", "30")?;
        if flush_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "VOCAB_FLUSH_INTERVAL_SECS",
                value: flush_secs.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        let max_pending: usize = try_load(&lookup, "VOCAB_MAX_PENDING", "1024")?;
        if max_pending == 0 {
            return Err(ConfigError::Invalid {
                key: "VOCAB_MAX_PENDING",
                value: max_pending.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        let db_url: String = try_load(&lookup, "VOCAB_DB_URL", "sqlite://vocabulary.sqlite3")?;
        if db_url.trim().is_empty() {
            return Err(ConfigError::DatabaseUrl(db_url));
        }

        Ok(Self {
            bind_addr: try_load(&lookup, "VOCAB_BIND_ADDR", "127.0.0.1")?,
            port: try_load(&lookup, "VOCAB_PORT", "8080")?,
            db_url: normalize_sqlite_url(&db_url),
            catalog_dir: try_load(&lookup, "VOCAB_CATALOG_DIR", "data")?,
            flush_interval: Duration::from_secs(flush_secs),
            max_pending,
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    #[must_use]
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            max_pending: self.max_pending,
        }
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }
    })
}

/// Turn a relative `SQLite` path or `sqlite:` URL into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
///
/// # Errors
///
/// Returns `ConfigError` if the URL has no path or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ConfigError::DatabaseUrl(db_url.to_string()))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ConfigError::DatabaseUrl(db_url.to_string()));
    }

    let path = Path::new(path);
    let io_err = |source| ConfigError::DatabaseFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(config.db_url.starts_with("sqlite://"));
        assert!(config.db_url.ends_with("vocabulary.sqlite3"));
        assert_eq!(config.catalog_dir, PathBuf::from("data"));
        assert_eq!(config.flush_interval, Duration::from_secs(30));
        assert_eq!(config.store_settings(), StoreSettings::default());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = config(&[
            ("VOCAB_PORT", " 9000 "),
            ("VOCAB_BIND_ADDR", "0.0.0.0"),
            ("VOCAB_DB_URL", "sqlite:///srv/vocab.db"),
            ("VOCAB_FLUSH_INTERVAL_SECS", "5"),
            ("VOCAB_MAX_PENDING", "16"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.db_url, "sqlite:///srv/vocab.db");
        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert_eq!(config.max_pending, 16);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = config(&[("VOCAB_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "VOCAB_PORT", .. }));

        let err = config(&[("VOCAB_FLUSH_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "VOCAB_FLUSH_INTERVAL_SECS",
                ..
            }
        ));

        let err = config(&[("VOCAB_MAX_PENDING", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "VOCAB_MAX_PENDING", .. }));
    }

    #[test]
    fn sqlite_urls_are_made_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/a.db"), "sqlite:///tmp/a.db");
        assert_eq!(normalize_sqlite_url("/tmp/a.db"), "sqlite:///tmp/a.db");

        let relative = normalize_sqlite_url("sqlite:dev.sqlite3");
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("/dev.sqlite3"));
    }

    #[test]
    fn database_file_and_parents_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vocab.sqlite3");
        let url = format!("sqlite://{}", path.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(path.exists());
        // A second call leaves the existing file alone.
        prepare_sqlite_file(&url).unwrap();

        assert!(matches!(
            prepare_sqlite_file("postgres://elsewhere"),
            Err(ConfigError::DatabaseUrl(_))
        ));
    }
}
