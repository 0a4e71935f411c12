use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::HttpConfig;
use crate::domain::AppError;

pub const ENV_MODELS_DIR: &str = "MODEL_MANAGER_DIR";
pub const ENV_CATALOG_FILE: &str = "MODEL_MANAGER_CATALOG";
pub const ENV_CONNECT_TIMEOUT: &str = "MODEL_MANAGER_CONNECT_TIMEOUT_SECS";
pub const ENV_READ_TIMEOUT: &str = "MODEL_MANAGER_READ_TIMEOUT_SECS";
pub const ENV_POLL_MS: &str = "MODEL_MANAGER_POLL_MS";

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Root under which every model gets its own folder
    pub models_dir: PathBuf,
    /// Optional JSON file replacing the built-in catalog
    pub catalog_file: Option<PathBuf>,
    pub http: HttpConfig,
    /// Write block size for streamed bodies
    pub chunk_size: usize,
    /// How often the UI drains the mailbox
    pub poll_interval: Duration,
    pub partial_suffix: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./ai_models"),
            catalog_file: None,
            http: HttpConfig::default(),
            chunk_size: 8192,
            poll_interval: Duration::from_millis(100),
            partial_suffix: ".part".to_string(),
        }
    }
}

impl ManagerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults, overridden by whatever `lookup` returns.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_MODELS_DIR).filter(|v| !v.trim().is_empty()) {
            config.models_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup(ENV_CATALOG_FILE).filter(|v| !v.trim().is_empty()) {
            config.catalog_file = Some(PathBuf::from(file));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CONNECT_TIMEOUT)? {
            config.http.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_READ_TIMEOUT)? {
            config.http.read_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_POLL_MS)? {
            if ms == 0 {
                return Err(AppError::Config(format!("{} must be positive", ENV_POLL_MS)));
            }
            config.poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::from_vars(|_| None).unwrap();
        assert_eq!(config.models_dir, PathBuf::from("./ai_models"));
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.http.connect_timeout, Duration::from_secs(30));
        assert!(config.catalog_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ManagerConfig::from_vars(lookup_from(&[
            (ENV_MODELS_DIR, "/tmp/models"),
            (ENV_CATALOG_FILE, "catalog.json"),
            (ENV_CONNECT_TIMEOUT, "5"),
            (ENV_POLL_MS, " 250 "),
        ]))
        .unwrap();
        assert_eq!(config.models_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.catalog_file, Some(PathBuf::from("catalog.json")));
        assert_eq!(config.http.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.http.read_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = ManagerConfig::from_vars(lookup_from(&[(ENV_READ_TIMEOUT, "soon")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = ManagerConfig::from_vars(lookup_from(&[(ENV_POLL_MS, "0")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
