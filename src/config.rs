use std::{env, fs, io, net::SocketAddr, path::PathBuf};

use reqwest::Url;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::routes::INDEX_ACTION;

/// Gateway behaviour options. Every value starts from a fresh default, so
/// one instance never leaks into another.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOptions {
    pub is_debug: bool,
    pub routes: Value,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            is_debug: false,
            routes: json!({ "/": { "get": INDEX_ACTION } }),
        }
    }
}

impl HttpOptions {
    pub fn debug(mut self, is_debug: bool) -> Self {
        self.is_debug = is_debug;
        self
    }

    /// Deep-merges `routes` over the default table.
    pub fn routes(mut self, routes: Value) -> Self {
        merge_values(&mut self.routes, routes);
        self
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub broker_url: Url,
    pub options: HttpOptions,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("XHTTP_BROKER_URL is required: the gateway depends on an action broker")]
    MissingBrokerUrl,
    #[error("XHTTP_BROKER_URL must be an absolute URL")]
    InvalidBrokerUrl,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("XHTTP_DEBUG must be a boolean")]
    InvalidDebugFlag,
    #[error("route table must be valid JSON")]
    InvalidRoutes(#[source] serde_json::Error),
    #[error("failed to read route table file {path}")]
    RoutesFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("action broker is not initialized")]
    BrokerNotReady,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let broker_url = non_empty("XHTTP_BROKER_URL")
            .ok_or(ConfigError::MissingBrokerUrl)?
            .parse::<Url>()
            .map_err(|_| ConfigError::InvalidBrokerUrl)?;

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = non_empty("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let is_debug = non_empty("XHTTP_DEBUG")
            .map(|value| parse_flag(&value).ok_or(ConfigError::InvalidDebugFlag))
            .transpose()?
            .unwrap_or(false);

        let routes_source = match non_empty("XHTTP_ROUTES") {
            Some(inline) => Some(inline),
            None => non_empty("XHTTP_ROUTES_FILE")
                .map(|path| {
                    let path = PathBuf::from(path);
                    fs::read_to_string(&path).map_err(|source| ConfigError::RoutesFile { path, source })
                })
                .transpose()?,
        };

        let mut options = HttpOptions::default().debug(is_debug);
        if let Some(source) = routes_source {
            let routes = serde_json::from_str::<Value>(&source).map_err(ConfigError::InvalidRoutes)?;
            options = options.routes(routes);
        }

        let config = Self {
            bind_addr,
            bind_port,
            broker_url,
            options,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
