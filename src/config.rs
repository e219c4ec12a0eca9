//! Dashboard configuration.
//!
//! Loaded from a TOML file, then overridden by command line flags.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::{cli::Cli, models::reading::Quantity};

/// Read when no `--config` is given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "air_quality_dashboard.toml";

/// Static address of the sensor on its network.
const DEFAULT_BASE_URL: &str = "http://192.168.3.15/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One status line per redraw
    #[default]
    Plain,
    /// One JSON object per redraw
    Json,
}

/// Endpoint paths, relative to the base url.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointPaths {
    #[serde(default = "default_humidity_path")]
    pub humidity: String,

    #[serde(default = "default_temperature_path")]
    pub temperature: String,

    #[serde(default = "default_co2_path")]
    pub co2: String,
}

fn default_humidity_path() -> String {
    "data/humidity".to_string()
}

fn default_temperature_path() -> String {
    "data/temperature".to_string()
}

fn default_co2_path() -> String {
    "data/co2ppm".to_string()
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            humidity: default_humidity_path(),
            temperature: default_temperature_path(),
            co2: default_co2_path(),
        }
    }
}

impl EndpointPaths {
    pub fn path(&self, quantity: Quantity) -> &str {
        match quantity {
            Quantity::Humidity => &self.humidity,
            Quantity::Temperature => &self.temperature,
            Quantity::Co2 => &self.co2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub endpoints: EndpointPaths,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            output: OutputFormat::default(),
            log_level: default_log_level(),
            endpoints: EndpointPaths::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}. Error: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path:?}. Error: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid base url '{url}': {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("poll_interval_ms must be greater than zero")]
    ZeroInterval,

    #[error("request_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

impl Config {
    /// Load from `path`, or from [`DEFAULT_CONFIG_PATH`] if it exists.
    /// Falls back to defaults when neither is available.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Command line flags take precedence over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(interval_ms) = cli.interval_ms {
            self.poll_interval_ms = interval_ms;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.request_timeout_ms = timeout_ms;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.base_url()?;
        Ok(())
    }

    /// The base url with a trailing slash, so endpoint paths join below it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: "can't be a base for endpoint paths".into(),
            });
        }
        Ok(url)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
