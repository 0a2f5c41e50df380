// Configuration types module
// Defines all configuration-related data structures

use crate::http::MaxAge;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub combo: ComboConfig,
    /// Global root prepended to every group's storage paths
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Groups, registered in file order
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Combo endpoint configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ComboConfig {
    #[serde(default = "default_combo_enabled")]
    pub enabled: bool,
    #[serde(default = "default_combo_base")]
    pub base: String,
    #[serde(default = "default_combo_separator")]
    pub separator: String,
    #[serde(default)]
    pub max_age: MaxAge,
    /// Extension to MIME type overrides, e.g. `{ tpl = "text/html" }`
    #[serde(default)]
    pub mime_types: HashMap<String, String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_combo_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_combo_base() -> String {
    "/combo?".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_combo_separator() -> String {
    "~".to_string()
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            enabled: default_combo_enabled(),
            base: default_combo_base(),
            separator: default_combo_separator(),
            max_age: MaxAge::default(),
            mime_types: HashMap::new(),
        }
    }
}

/// One group; served under `/<name>/`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: GroupKind,
    #[serde(default)]
    pub max_age: MaxAge,
}

/// Group resolution types
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupKind {
    /// Only the listed files, request path to storage path
    Map { urls: HashMap<String, String> },
    /// Everything under a directory
    Folder { path: PathBuf },
}
