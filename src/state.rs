use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AppConfig;
use crate::events::EventHub;

/// Shared application state passed to the reconcile loop and API handlers.
pub struct AppState {
    pub config: AppConfig,
    pub event_hub: EventHub,
    pub status: tokio::sync::RwLock<DaemonStatus>,
}

impl AppState {
    pub fn new(config: AppConfig, event_hub: EventHub) -> Self {
        Self { config, event_hub, status: tokio::sync::RwLock::new(DaemonStatus::idle()) }
    }

    /// Mark a tick as started.
    pub async fn begin_tick(&self) {
        self.status.write().await.state = DaemonState::Reconciling;
    }

    /// Record a finished tick and return to idle.
    pub async fn finish_tick(&self, summary: TickSummary) {
        let mut status = self.status.write().await;
        status.state = DaemonState::Idle;
        status.last_tick = Some(summary);
    }
}

/// The daemon's operating state, serialized to the API as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonState {
    Idle,
    Reconciling,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaemonStatus {
    pub state: DaemonState,
    pub last_tick: Option<TickSummary>,
}

impl DaemonStatus {
    pub const fn idle() -> Self {
        Self { state: DaemonState::Idle, last_tick: None }
    }
}

/// What happened during one reconcile tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Local mounts whose claim could be identified.
    pub volumes_discovered: usize,
    /// Volumes that had both a claim and a `VolumeScaler`.
    pub volumes_evaluated: usize,
    pub resizes_requested: usize,
    /// Volumes whose processing failed this tick.
    pub failures: usize,
    /// Set when the whole tick was aborted.
    pub error: Option<String>,
}
