use super::crd::VolumeScaler;
use super::signals::FailureSignal;
use anyhow::Result;
use serde::Serialize;

/// The slice of a PersistentVolumeClaim the reconciler works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClaimSnapshot {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    /// `spec.resources.requests.storage`
    pub requested: String,
    /// `status.capacity.storage`; absent until the claim is bound.
    pub reported: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum NoticeType {
    Normal,
    Warning,
}

impl NoticeType {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Warning",
        }
    }
}

/// A human-readable notification attached to a `VolumeScaler`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Notice {
    pub kind: NoticeType,
    pub reason: &'static str,
    pub message: String,
}

impl Notice {
    pub(crate) fn normal(reason: &'static str, message: impl Into<String>) -> Self {
        Self { kind: NoticeType::Normal, reason, message: message.into() }
    }

    pub(crate) fn warning(reason: &'static str, message: impl Into<String>) -> Self {
        Self { kind: NoticeType::Warning, reason, message: message.into() }
    }
}

/// Everything the daemon needs from the orchestration API.
pub(crate) trait ClusterApi {
    /// All claims in the cluster.
    async fn list_claims(&self) -> Result<Vec<ClaimSnapshot>>;

    /// All `VolumeScaler` objects in the cluster.
    async fn list_scalers(&self) -> Result<Vec<VolumeScaler>>;

    /// Resolve a PersistentVolume name to the UID of the claim bound to it.
    async fn claim_uid_for_volume(&self, volume_name: &str) -> Result<Option<String>>;

    /// Merge-patch the claim's requested storage.
    async fn patch_claim_storage(&self, namespace: &str, claim: &str, size: &str) -> Result<()>;

    /// Merge-patch the scaler's status subresource. Only `Some` fields are sent.
    async fn patch_scaler_status(
        &self,
        namespace: &str,
        scaler: &str,
        patch: &StatusPatch,
    ) -> Result<()>;

    /// Recent notifications whose involved object is the named claim.
    async fn claim_signals(&self, namespace: &str, claim: &str) -> Result<Vec<FailureSignal>>;

    /// Record a notification against the scaler.
    async fn notify(&self, scaler: &VolumeScaler, notice: &Notice) -> Result<()>;
}

/// Partial status update. `None` fields are left untouched by the merge patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_max_size: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_in_progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_requested_size: Option<String>,
}
