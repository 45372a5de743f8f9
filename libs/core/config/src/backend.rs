use crate::{env_or_default, env_parse_or, ConfigError, FromEnv};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/todos";
pub const DEFAULT_DATA_DIR: &str = ".todo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which persistence backend the todo repository talks to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Snapshot file on local disk
    #[default]
    Local,
    /// HTTP API at `TODO_API_URL`
    Remote,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            other => Err(format!("unknown backend '{}', expected 'local' or 'remote'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// Remote todo API configuration
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl FromEnv for ApiConfig {
    /// Reads from environment variables with defaults:
    /// - TODO_API_URL: defaults to http://localhost:8080/api/todos
    /// - TODO_API_TIMEOUT_SECS: defaults to 10
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_or_default("TODO_API_URL", DEFAULT_API_URL);
        let timeout_secs = env_parse_or("TODO_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self::new(base_url, Duration::from_secs(timeout_secs)))
    }
}

/// Local snapshot storage configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl FromEnv for StorageConfig {
    /// TODO_DATA_DIR: defaults to `.todo` in the working directory
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(env_or_default("TODO_DATA_DIR", DEFAULT_DATA_DIR)))
    }
}

/// Complete backend selection, resolved once at startup
#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub storage: StorageConfig,
    pub api: ApiConfig,
}

impl FromEnv for BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let kind = env_parse_or("TODO_BACKEND", BackendKind::default())?;

        Ok(Self {
            kind,
            storage: StorageConfig::from_env()?,
            api: ApiConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_defaults() {
        temp_env::with_vars(
            [
                ("TODO_BACKEND", None::<&str>),
                ("TODO_DATA_DIR", None),
                ("TODO_API_URL", None),
                ("TODO_API_TIMEOUT_SECS", None),
            ],
            || {
                let config = BackendConfig::from_env().unwrap();
                assert_eq!(config.kind, BackendKind::Local);
                assert_eq!(config.storage.data_dir, PathBuf::from(".todo"));
                assert_eq!(config.api.base_url, DEFAULT_API_URL);
                assert_eq!(config.api.timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn test_backend_config_remote_overrides() {
        temp_env::with_vars(
            [
                ("TODO_BACKEND", Some("REMOTE")),
                ("TODO_API_URL", Some("http://todo.internal:9000/api/todos/")),
                ("TODO_API_TIMEOUT_SECS", Some("3")),
            ],
            || {
                let config = BackendConfig::from_env().unwrap();
                assert_eq!(config.kind, BackendKind::Remote);
                assert_eq!(config.api.base_url, "http://todo.internal:9000/api/todos");
                assert_eq!(config.api.timeout, Duration::from_secs(3));
            },
        );
    }

    #[test]
    fn test_backend_config_invalid_kind() {
        temp_env::with_var("TODO_BACKEND", Some("cloud"), || {
            let err = BackendConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TODO_BACKEND"));
        });
    }

    #[test]
    fn test_api_config_invalid_timeout() {
        temp_env::with_var("TODO_API_TIMEOUT_SECS", Some("soon"), || {
            let err = ApiConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TODO_API_TIMEOUT_SECS"));
        });
    }

    #[test]
    fn test_backend_kind_display_round_trip() {
        for kind in [BackendKind::Local, BackendKind::Remote] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}
