// Configuration module entry point
// Loads layered configuration and builds the application state from it

mod state;
mod types;

use std::net::{AddrParseError, SocketAddr};

pub use state::AppState;
pub use types::{
    ComboConfig, Config, GroupConfig, GroupKind, LoggingConfig, PerformanceConfig, ServerConfig,
};

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid listen address {addr}: {source}")]
    Address {
        addr: String,
        #[source]
        source: AddrParseError,
    },
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

fn with_defaults(builder: Builder) -> Result<Builder, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 75)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("combo.enabled", true)?
        .set_default("combo.base", "/combo?")?
        .set_default("combo.separator", "~")
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. `COMBO_`-prefixed environment variables override
    /// it, with `__` between nested keys (`COMBO_SERVER__PORT=9000`).
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("COMBO")
                    .prefix_separator("_")
                    .separator("__"),
            );
        let settings = with_defaults(builder)?.build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse TOML text, defaults applied, without consulting the environment
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml));
        let settings = with_defaults(builder)?.build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::Address { addr, source })
    }
}
