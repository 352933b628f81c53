use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Autoscaling policy for a single PersistentVolumeClaim in the same namespace.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "autoscaling.storage.k8s.io",
    version = "v1alpha1",
    kind = "VolumeScaler",
    plural = "volumescalers",
    shortname = "vs",
    namespaced,
    status = "VolumeScalerStatus",
    printcolumn = r#"{"name":"PVC", "type":"string", "jsonPath":".spec.pvcName"}"#,
    printcolumn = r#"{"name":"Threshold", "type":"string", "jsonPath":".spec.threshold"}"#,
    printcolumn = r#"{"name":"MaxSize", "type":"string", "jsonPath":".spec.maxSize"}"#,
    printcolumn = r#"{"name":"Resizing", "type":"boolean", "jsonPath":".status.resizeInProgress"}"#,
    printcolumn = r#"{"name":"AtMax", "type":"boolean", "jsonPath":".status.reachedMaxSize"}"#
)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeScalerSpec {
    /// Name of the claim to grow.
    pub pvc_name: String,

    /// Usage that triggers expansion, e.g. `70%`.
    pub threshold: String,

    /// Growth per expansion: `2Gi` for fixed, `30%` for percentage.
    pub scale: String,

    /// `fixed` or `percentage`. Anything else grows by percentage.
    #[serde(default)]
    pub scale_type: String,

    /// Minimum time between expansions, e.g. `10m` or `1h30m`.
    #[serde(default)]
    pub cooldown_period: String,

    /// Hard ceiling on the requested size, e.g. `15Gi`.
    pub max_size: String,
}

/// Lifecycle state written back by the daemon.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeScalerStatus {
    /// RFC 3339 time of the last expansion request or completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaled_at: Option<String>,

    #[serde(default)]
    pub reached_max_size: bool,

    #[serde(default)]
    pub resize_in_progress: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_requested_size: Option<String>,
}
