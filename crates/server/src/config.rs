//! Relay server configuration

use std::net::SocketAddr;
use std::sync::Arc;

use wasapp_core::router::{is_valid_time_format, DEFAULT_TIME_FORMAT};

use crate::error::{Error, Result};
use crate::hub::Hub;

/// Configuration for the Wasapp relay server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: SocketAddr,
    /// Browser origin allowed by CORS
    pub allowed_origin: String,
    /// Queued events per connection before new ones are dropped
    pub outbox_capacity: usize,
    /// strftime pattern for message timestamps
    pub time_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            allowed_origin: "http://localhost:5173".to_string(),
            outbox_capacity: 256,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `WASAPP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("WASAPP_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("WASAPP_ADDR: {:?} is not a socket address", addr)))?;
        }
        if let Some(origin) = lookup("WASAPP_CORS_ORIGIN") {
            config.allowed_origin = origin;
        }
        if let Some(capacity) = lookup("WASAPP_OUTBOX_CAPACITY") {
            config.outbox_capacity = match capacity.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "WASAPP_OUTBOX_CAPACITY: {:?} is not a positive integer",
                        capacity
                    )))
                }
            };
        }
        if let Some(format) = lookup("WASAPP_TIME_FORMAT") {
            if !is_valid_time_format(&format) {
                return Err(Error::InvalidConfig(format!(
                    "WASAPP_TIME_FORMAT: {:?} is not a valid strftime pattern",
                    format
                )));
            }
            config.time_format = format;
        }

        Ok(config)
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(Hub::with_time_format(&config.time_format));
        Self { config, hub }
    }
}
