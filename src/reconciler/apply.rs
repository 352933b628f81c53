use super::Reconciler;
use crate::cluster::{ClaimSnapshot, ClusterApi, Notice, NoticeType, VolumeScaler};
use crate::engine::{Decision, Evaluation, IdleReason, Measurement, VolumeSnapshot};
use crate::events::Event;
use crate::node::UsageSampler;
use crate::scaling::format_size;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tracing::{error, info, warn};

fn usage_text(measurement: &Measurement) -> String {
    measurement.sample().map_or_else(|| "unknown".to_string(), |s| format!("{}%", s.percent))
}

fn used_text(measurement: &Measurement) -> String {
    measurement.sample().map_or_else(|| "unknown".to_string(), |s| format!("{}Gi", s.used_gib))
}

impl<C: ClusterApi, S: UsageSampler> Reconciler<C, S> {
    /// Carry out a decision: patch the claim and scaler status, emit
    /// notifications, log, and publish to the event hub.
    ///
    /// Returns whether a resize was requested. Errors mean the claim or status
    /// patch failed; notification failures are only logged.
    pub(super) async fn apply(
        &self,
        claim: &ClaimSnapshot,
        scaler: &VolumeScaler,
        snapshot: VolumeSnapshot,
        evaluation: &Evaluation,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let pvc = format!("{}/{}", claim.namespace, claim.name);
        let measurement = &evaluation.measurement;
        let usage = usage_text(measurement);

        match measurement {
            Measurement::MountNotFound => {
                self.notify(
                    scaler,
                    Notice::warning(
                        "MountNotFound",
                        format!("No mount path found for PVC '{}'", claim.name),
                    ),
                )
                .await;
            }
            Measurement::Failed(reason) => {
                self.notify(
                    scaler,
                    Notice::warning(
                        "MeasureFailed",
                        format!("Failed measuring usage for PVC '{pvc}': {reason}"),
                    ),
                )
                .await;
            }
            Measurement::Skipped | Measurement::Sampled(_) => {}
        }

        let decision = &evaluation.decision;
        let mut requested_resize = false;
        let mut result = Ok(());

        match decision {
            Decision::InvalidPolicy { field, detail } => {
                self.notify(
                    scaler,
                    Notice::warning(field.reason(), format!("VolumeScaler for PVC '{pvc}': {detail}")),
                )
                .await;
            }
            Decision::ReachedMaxSize { max_gib } => {
                result = self.patch_status(scaler, decision, now).await;
                self.notify(
                    scaler,
                    Notice::warning(
                        "AtMaxSize",
                        format!(
                            "PVC '{pvc}' reached maxSize={}. usage={usage}",
                            format_size(*max_gib)
                        ),
                    ),
                )
                .await;
            }
            Decision::ResizeComplete { .. } => {
                self.notify(
                    scaler,
                    Notice::normal(
                        "ResizeComplete",
                        format!(
                            "PVC '{pvc}' expansion complete. Capacity={}, usage={usage}.",
                            format_size(snapshot.reported_gib)
                        ),
                    ),
                )
                .await;
                result = self.patch_status(scaler, decision, now).await;
            }
            Decision::StillResizing { failure_reason } => {
                let cause =
                    failure_reason.as_deref().map(|r| format!(" due to '{r}'")).unwrap_or_default();
                let message = format!(
                    "PVC '{pvc}' still resizing (Spec={}, Status={}){cause}. usage={} ({usage}).",
                    format_size(snapshot.requested_gib),
                    format_size(snapshot.reported_gib),
                    used_text(measurement),
                );
                self.notify(scaler, Notice::warning("StillResizing", message)).await;
            }
            Decision::CooldownActive => {
                self.notify(
                    scaler,
                    Notice::normal(
                        "CooldownActive",
                        format!(
                            "PVC '{pvc}' usage={usage} >= threshold={}, but in cooldown. Skipping expansion.",
                            scaler.spec.threshold
                        ),
                    ),
                )
                .await;
            }
            Decision::RequestResize { new_capacity_gib } => {
                let new_size = format_size(*new_capacity_gib);
                let current = format_size(snapshot.requested_gib);
                if let Err(e) =
                    self.cluster.patch_claim_storage(&claim.namespace, &claim.name, &new_size).await
                {
                    self.notify(
                        scaler,
                        Notice::warning(
                            "ResizeFailed",
                            format!("Failed initiating expansion from {current} -> {new_size}: {e:#}"),
                        ),
                    )
                    .await;
                    return Err(e.context(format!("requesting {new_size} for PVC '{pvc}'")));
                }

                requested_resize = true;
                self.notify(
                    scaler,
                    Notice::normal(
                        "ResizeRequested",
                        format!(
                            "Initiated resize of PVC '{pvc}' from {current} -> {new_size}. usage={usage}, used={}",
                            used_text(measurement)
                        ),
                    ),
                )
                .await;
                result = self.patch_status(scaler, decision, now).await;
            }
            Decision::NoAction { reason } => match reason {
                IdleReason::BelowThreshold { .. } => info!(
                    "PVC '{}' usage={} < threshold={}; no expansion needed.",
                    pvc, usage, scaler.spec.threshold
                ),
                IdleReason::Unmeasured => {
                    info!("PVC '{}' usage unknown; skipping threshold check.", pvc);
                }
                IdleReason::NoNetGrowth { candidate_gib } => info!(
                    "PVC '{}' computed newSize={} <= current={}. usage={} => no net expansion.",
                    pvc,
                    format_size(*candidate_gib),
                    format_size(snapshot.requested_gib),
                    usage
                ),
            },
        }

        self.state.event_hub.publish(Event::VolumeEvaluated {
            namespace: claim.namespace.clone(),
            scaler: scaler.name_any(),
            claim: claim.name.clone(),
            decision: decision.clone(),
            usage: measurement.sample(),
        });

        result.map(|()| requested_resize)
    }

    async fn patch_status(
        &self,
        scaler: &VolumeScaler,
        decision: &Decision,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(patch) = decision.status_patch(now) else {
            return Ok(());
        };
        let namespace = scaler.namespace().unwrap_or_default();
        let result = self.cluster.patch_scaler_status(&namespace, &scaler.name_any(), &patch).await;
        if let Err(e) = &result {
            self.notify(
                scaler,
                Notice::warning(
                    "StatusUpdateFailed",
                    format!(
                        "Failed updating VolumeScaler status after {}; status may not match the PVC: {e:#}",
                        decision.label()
                    ),
                ),
            )
            .await;
        }
        result.with_context(|| format!("updating status after {}", decision.label()))
    }

    /// Log the notice and attach it to the scaler. Delivery failures are logged only.
    pub(super) async fn notify(&self, scaler: &VolumeScaler, notice: Notice) {
        match notice.kind {
            NoticeType::Normal => info!("[{}] {}", notice.reason, notice.message),
            NoticeType::Warning => warn!("[{}] {}", notice.reason, notice.message),
        }
        if let Err(e) = self.cluster.notify(scaler, &notice).await {
            error!("Failed to record {} event on {}: {:#}", notice.reason, scaler.name_any(), e);
        }
    }
}
