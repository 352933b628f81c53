use crate::cluster::{StatusPatch, VolumeScalerSpec, VolumeScalerStatus};
use crate::node::UsageSample;
use crate::scaling::format_size;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;

/// Capacities closer than this (in GiB) are the same size.
const CAPACITY_EPSILON: f64 = 1e-9;

/// Requested and reported capacity of a claim, in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct VolumeSnapshot {
    pub requested_gib: f64,
    pub reported_gib: f64,
}

impl VolumeSnapshot {
    /// The storage system has not yet delivered what was requested.
    pub(crate) fn resize_pending(&self) -> bool {
        self.reported_gib < self.requested_gib - CAPACITY_EPSILON
    }

    /// No resize is in flight.
    pub(crate) fn settled(&self) -> bool {
        !self.resize_pending()
    }
}

/// Everything the engine looks at for one volume in one tick.
#[derive(Debug, Clone)]
pub(crate) struct VolumeInput<'a> {
    pub spec: &'a VolumeScalerSpec,
    pub status: &'a VolumeScalerStatus,
    pub snapshot: VolumeSnapshot,
    /// `None` when no local mount was found for the claim.
    pub mount_path: Option<&'a Path>,
    /// Most recent resize failure reported for the claim. Only looked up while
    /// a resize is pending.
    pub resize_failure: Option<String>,
}

/// Which policy field could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum PolicyField {
    Threshold,
    MaxSize,
    CooldownPeriod,
    ScaledAt,
    Scale,
}

impl PolicyField {
    /// Notification reason for this field.
    pub(crate) const fn reason(self) -> &'static str {
        match self {
            Self::Threshold => "InvalidThreshold",
            Self::MaxSize => "InvalidMaxSize",
            Self::CooldownPeriod => "InvalidCooldown",
            Self::ScaledAt => "CooldownError",
            Self::Scale => "ScaleParseError",
        }
    }
}

/// Why a settled volume was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum IdleReason {
    BelowThreshold { threshold: f64 },
    /// Usage could not be measured, so the threshold check is inconclusive.
    Unmeasured,
    /// Growth was clamped away by the max size.
    NoNetGrowth { candidate_gib: f64 },
}

/// The single outcome of evaluating a volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub(crate) enum Decision {
    NoAction { reason: IdleReason },
    ReachedMaxSize { max_gib: f64 },
    ResizeComplete { reached_max: bool },
    StillResizing { failure_reason: Option<String> },
    CooldownActive,
    RequestResize { new_capacity_gib: f64 },
    InvalidPolicy { field: PolicyField, detail: String },
}

impl Decision {
    /// Status fields this decision changes, if any.
    pub(crate) fn status_patch(&self, now: DateTime<Utc>) -> Option<StatusPatch> {
        let stamp = || Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
        match self {
            // A resize that lands exactly on the max never reports completion,
            // so the in-progress flag is cleared here as well.
            Self::ReachedMaxSize { .. } => Some(StatusPatch {
                reached_max_size: Some(true),
                resize_in_progress: Some(false),
                ..StatusPatch::default()
            }),
            Self::ResizeComplete { reached_max } => Some(StatusPatch {
                resize_in_progress: Some(false),
                scaled_at: stamp(),
                reached_max_size: Some(*reached_max),
                last_requested_size: None,
            }),
            Self::RequestResize { new_capacity_gib } => Some(StatusPatch {
                resize_in_progress: Some(true),
                last_requested_size: Some(format_size(*new_capacity_gib)),
                scaled_at: stamp(),
                reached_max_size: None,
            }),
            Self::NoAction { .. }
            | Self::StillResizing { .. }
            | Self::CooldownActive
            | Self::InvalidPolicy { .. } => None,
        }
    }

    /// Short label used in logs and the event stream.
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::NoAction { .. } => "no_action",
            Self::ReachedMaxSize { .. } => "reached_max_size",
            Self::ResizeComplete { .. } => "resize_complete",
            Self::StillResizing { .. } => "still_resizing",
            Self::CooldownActive => "cooldown_active",
            Self::RequestResize { .. } => "request_resize",
            Self::InvalidPolicy { .. } => "invalid_policy",
        }
    }
}

/// Outcome of trying to measure usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub(crate) enum Measurement {
    /// The policy was rejected before measuring.
    Skipped,
    Sampled(UsageSample),
    MountNotFound,
    Failed(String),
}

impl Measurement {
    pub(crate) const fn sample(&self) -> Option<UsageSample> {
        match self {
            Self::Sampled(s) => Some(*s),
            Self::Skipped | Self::MountNotFound | Self::Failed(_) => None,
        }
    }
}

/// A decision together with the measurement it was based on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Evaluation {
    pub decision: Decision,
    pub measurement: Measurement,
}
