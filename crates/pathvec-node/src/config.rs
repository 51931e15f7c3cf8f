//! TOML-based configuration for protocol nodes.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use pathvec_core::types::NodeId;
use pathvec_routing::advert::ExpiryScope;

use crate::error::NodeError;

/// Top-level node configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl NodeConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, NodeError> {
        let config: NodeConfig = toml::from_str(s)
            .map_err(|e| NodeError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration for node `id`.
    pub fn for_node(id: u32) -> Self {
        Self {
            node: NodeSection {
                id,
                ..NodeSection::default()
            },
            logging: LoggingSection::default(),
        }
    }

    /// Check every derived value, reporting the first problem found.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.node.interval()?;
        self.node.timeout()?;
        self.node.expiry_scope()?;
        parse_log_format(&self.logging.format)?;
        Ok(())
    }
}

/// The `[node]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSection {
    #[serde(default)]
    pub id: u32,
    /// Expected number of neighbors. Informational only.
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: u32,
    /// Upper bound, in seconds, of the random delay between advertisements.
    #[serde(default = "default_interval")]
    pub interval: f64,
    /// Seconds after which an advertisement that was not refreshed is dropped.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Seed for the send-delay generator. Drawn from OS entropy when absent.
    pub seed: Option<u64>,
    /// `"neighbor"` or `"route"`.
    #[serde(default = "default_expiry_scope")]
    pub expiry_scope: String,
    /// Whether each send tick advertises the node itself.
    #[serde(default = "default_announce_self")]
    pub announce_self: bool,
}

fn default_neighbor_count() -> u32 {
    10
}

fn default_interval() -> f64 {
    20.0
}

fn default_timeout() -> f64 {
    60.0
}

fn default_expiry_scope() -> String {
    "neighbor".to_string()
}

fn default_announce_self() -> bool {
    true
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            id: 0,
            neighbor_count: default_neighbor_count(),
            interval: default_interval(),
            timeout: default_timeout(),
            seed: None,
            expiry_scope: default_expiry_scope(),
            announce_self: default_announce_self(),
        }
    }
}

impl NodeSection {
    pub fn node_id(&self) -> NodeId {
        NodeId(self.id)
    }

    pub fn interval(&self) -> Result<Duration, NodeError> {
        parse_seconds("interval", self.interval)
    }

    pub fn timeout(&self) -> Result<Duration, NodeError> {
        parse_seconds("timeout", self.timeout)
    }

    pub fn expiry_scope(&self) -> Result<ExpiryScope, NodeError> {
        parse_expiry_scope(&self.expiry_scope)
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `"plain"` or `"json"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "plain".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Parse an expiry scope string.
pub fn parse_expiry_scope(s: &str) -> Result<ExpiryScope, NodeError> {
    match s.to_lowercase().as_str() {
        "neighbor" | "neighbour" => Ok(ExpiryScope::Neighbor),
        "route" | "destination" => Ok(ExpiryScope::Route),
        other => Err(NodeError::Config(format!("unknown expiry scope: {other}"))),
    }
}

/// Parse a log format string.
pub fn parse_log_format(s: &str) -> Result<LogFormat, NodeError> {
    match s.to_lowercase().as_str() {
        "plain" | "text" => Ok(LogFormat::Plain),
        "json" => Ok(LogFormat::Json),
        other => Err(NodeError::Config(format!("unknown log format: {other}"))),
    }
}

/// Convert a positive, finite number of seconds into a `Duration`.
fn parse_seconds(name: &str, secs: f64) -> Result<Duration, NodeError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(NodeError::Config(format!(
            "{name} must be a positive number of seconds, got {secs}"
        )));
    }
    let duration = Duration::try_from_secs_f64(secs)
        .map_err(|e| NodeError::Config(format!("invalid {name} '{secs}': {e}")))?;
    // node clocks tick in whole milliseconds
    if duration < Duration::from_millis(1) {
        return Err(NodeError::Config(format!(
            "{name} must be at least 0.001 seconds (the clock resolution), got {secs}"
        )));
    }
    Ok(duration)
}
