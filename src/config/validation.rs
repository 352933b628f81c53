use super::defaults::MAX_POLL_INTERVAL_SECS;
use super::settings::AppConfig;
use anyhow::Result;

impl AppConfig {
    /// Validate configuration values are sane.
    pub(crate) fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.port > 0, "Port must be > 0");
        anyhow::ensure!(
            (1..=MAX_POLL_INTERVAL_SECS).contains(&self.poll_interval_secs),
            "poll_interval_secs must be between 1 and {MAX_POLL_INTERVAL_SECS}"
        );
        anyhow::ensure!(!self.kubelet_pods_path.is_empty(), "kubelet_pods_path must be set");
        anyhow::ensure!(!self.event_component.is_empty(), "event_component must be set");
        Ok(())
    }
}
