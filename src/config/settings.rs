use super::defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_EVENT_COMPONENT, DEFAULT_KUBELET_PODS_PATH,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PORT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub config_path: String,
    /// Root of the kubelet's pod directories on this node.
    pub kubelet_pods_path: String,
    pub poll_interval_secs: u64,
    /// Node this daemon runs on; only used for log and event context.
    pub node_name: Option<String>,
    pub event_component: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            kubelet_pods_path: DEFAULT_KUBELET_PODS_PATH.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            node_name: None,
            event_component: DEFAULT_EVENT_COMPONENT.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration, merging defaults with env overrides and config file values.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("VS_CONFIG_PATH") {
            config.config_path = path;
        }
        if let Ok(port) = std::env::var("VS_PORT") {
            config.port = port.parse().context("VS_PORT must be a valid port number")?;
        }
        if let Ok(path) = std::env::var("KUBELET_PODS_PATH") {
            config.kubelet_pods_path = path;
        }
        if let Ok(secs) = std::env::var("POLL_INTERVAL") {
            config.poll_interval_secs =
                secs.parse().context("POLL_INTERVAL must be a whole number of seconds")?;
        }
        if let Ok(node) = std::env::var("NODE_NAME") {
            config.node_name = Some(node).filter(|n| !n.is_empty());
        }

        let cfg_path = Path::new(&config.config_path);
        if cfg_path.exists() {
            let contents = fs::read_to_string(cfg_path)
                .with_context(|| format!("Failed to read config file: {}", config.config_path))?;
            config.parse_ini(&contents);
        }

        config.validate()?;
        Ok(config)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
