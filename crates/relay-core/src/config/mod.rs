//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files layered under `RELAY__*` environment variables.
//! Each sub-module represents a logical configuration section.

pub mod app;
pub mod logging;
pub mod realtime;
pub mod static_page;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::static_page::StaticPageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Every section falls back to its defaults, so the relay starts with no
/// configuration files present at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Real-time WebSocket settings.
    pub realtime: RealtimeConfig,
    /// Static document settings.
    pub static_page: StaticPageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the `config/` directory.
    ///
    /// See [`AppConfig::load_from`].
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from TOML files in `dir`.
    ///
    /// Merges `default.toml` with an environment-specific overlay
    /// (`{env}.toml`) and environment variables prefixed with `RELAY__`.
    /// Missing files are skipped.
    pub fn load_from(dir: impl AsRef<Path>, env: &str) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        let config = config::Config::builder()
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(env)).required(false))
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the relay cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.realtime.max_connections == 0 {
            return Err(AppError::configuration(
                "realtime.max_connections must be greater than zero",
            ));
        }
        if self.realtime.outbound_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.outbound_buffer_size must be greater than zero",
            ));
        }
        if self.realtime.send_timeout_ms == 0 {
            return Err(AppError::configuration(
                "realtime.send_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// The `host:port` pair the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
