//! Configuration module for the JSON config file.
//!
//! The relay reads a single JSON file once at startup. Its path comes from the
//! `AUTOCARD_CONFIG_FILE` environment variable and defaults to `autocard.json`.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Environment variable naming the config file.
pub const CONFIG_FILE_ENV: &str = "AUTOCARD_CONFIG_FILE";

/// Config file used when `AUTOCARD_CONFIG_FILE` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "autocard.json";

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("key `apiHost` (or `githubRoot`) missing from {}", .path.display())]
    MissingApiHost { path: PathBuf },

    #[error("key `{key}` in {} must not be empty", .path.display())]
    Empty { path: PathBuf, key: &'static str },

    #[error("`apiHost` value {value:?} in {} is not a usable base URL", .path.display())]
    ApiHost { path: PathBuf, value: String },
}

/// Relay configuration, immutable after load.
#[derive(Clone)]
pub struct Config {
    /// GitHub token sent as `Authorization: token ...`
    pub token: String,

    /// Shared webhook secret used for `X-Hub-Signature`
    pub secret: String,

    /// Port for the web server to listen on
    pub listen_port: u16,

    /// API host, e.g. `api.github.com` or `ghe.example.com/api/v3`.
    /// A value with an explicit scheme is used as-is.
    pub api_host: String,

    /// Verbose request logging
    pub debug: bool,
}

/// On-disk layout. `apiHost` takes precedence over the older `githubRoot`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    token: String,
    secret: String,
    listen_port: u16,
    #[serde(default)]
    api_host: Option<String>,
    #[serde(default)]
    github_root: Option<String>,
    #[serde(default)]
    debug: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"[redacted]")
            .field("secret", &"[redacted]")
            .field("listen_port", &self.listen_port)
            .field("api_host", &self.api_host)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    /// Parse and validate config file contents. `path` is only used in errors.
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let api_host = file
            .api_host
            .or(file.github_root)
            .ok_or_else(|| ConfigError::MissingApiHost {
                path: path.to_path_buf(),
            })?;

        let config = Config {
            token: file.token,
            secret: file.secret,
            listen_port: file.listen_port,
            api_host,
            debug: file.debug,
        };

        if config.token.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
                key: "token",
            });
        }
        if config.secret.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
                key: "secret",
            });
        }
        if config.api_base_url().is_none() {
            return Err(ConfigError::ApiHost {
                path: path.to_path_buf(),
                value: config.api_host.clone(),
            });
        }

        Ok(config)
    }

    /// Base URL for REST calls, derived from `api_host`.
    ///
    /// Bare hosts get an `https://` scheme. Returns `None` when the result is
    /// not an http(s) URL that can take path segments.
    pub fn api_base_url(&self) -> Option<Url> {
        let host = self.api_host.trim().trim_end_matches('/');
        if host.is_empty() {
            return None;
        }

        let url = if host.contains("://") {
            Url::parse(host).ok()?
        } else {
            Url::parse(&format!("https://{}", host)).ok()?
        };

        match url.scheme() {
            "http" | "https" if !url.cannot_be_a_base() => Some(url),
            _ => None,
        }
    }
}

/// Resolve the config file path from the environment.
pub fn config_path_from_env() -> PathBuf {
    env::var_os(CONFIG_FILE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
