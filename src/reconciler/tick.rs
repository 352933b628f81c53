use super::error::TickError;
use super::Reconciler;
use crate::cluster::{latest_resize_failure, ClaimSnapshot, ClusterApi, Notice, VolumeScaler};
use crate::engine::{VolumeInput, VolumeSnapshot};
use crate::node::{discover_volume_mounts, LocalMount, MountSource, UsageSampler};
use crate::scaling::{to_gib, ScalingError};
use crate::state::TickSummary;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Summary for a tick that never got past discovery or listing.
pub(super) fn aborted_summary(started_at: DateTime<Utc>, err: &TickError) -> TickSummary {
    TickSummary {
        started_at: Some(started_at),
        finished_at: Some(Utc::now()),
        error: Some(err.to_string()),
        ..TickSummary::default()
    }
}

fn scaler_key(namespace: &str, claim: &str) -> String {
    format!("{namespace}/{claim}")
}

impl<C: ClusterApi, S: UsageSampler> Reconciler<C, S> {
    /// One full pass: discover local mounts, join them with claims and
    /// scalers, then evaluate and apply each volume in turn.
    ///
    /// A failing volume is logged and counted; it never stops the others.
    pub(crate) async fn reconcile_once(&self, now: DateTime<Utc>) -> Result<TickSummary, TickError> {
        let mut summary = TickSummary { started_at: Some(now), ..TickSummary::default() };

        let local = self.discover().await?;
        let mounts = self.resolve_claim_uids(local).await;
        summary.volumes_discovered = mounts.len();

        if mounts.is_empty() {
            info!("No PVCs found on this node");
            summary.finished_at = Some(Utc::now());
            return Ok(summary);
        }

        let claims = self
            .cluster
            .list_claims()
            .await
            .map_err(|source| TickError::ListFailed { what: "PVCs", source })?;
        let scalers = self
            .cluster
            .list_scalers()
            .await
            .map_err(|source| TickError::ListFailed { what: "VolumeScalers", source })?;

        let claims_by_uid: HashMap<&str, &ClaimSnapshot> =
            claims.iter().map(|c| (c.uid.as_str(), c)).collect();
        let scalers_by_claim = index_scalers(&scalers);

        for (uid, mount_path) in &mounts {
            let Some(claim) = claims_by_uid.get(uid.as_str()) else {
                debug!("Local mount for unknown PVC uid {}, skipping", uid);
                continue;
            };
            let Some(scaler) = scalers_by_claim.get(&scaler_key(&claim.namespace, &claim.name))
            else {
                continue;
            };

            summary.volumes_evaluated += 1;
            match self.process_volume(claim, scaler, Some(mount_path.as_path()), now).await {
                Ok(requested_resize) => {
                    if requested_resize {
                        summary.resizes_requested += 1;
                    }
                }
                Err(e) => {
                    summary.failures += 1;
                    error!(
                        "Failed processing PVC '{}/{}' (VolumeScaler {}): {:#}",
                        claim.namespace,
                        claim.name,
                        scaler.name_any(),
                        e
                    );
                }
            }
        }

        summary.finished_at = Some(Utc::now());
        info!(
            "Tick complete: {} local volumes, {} evaluated, {} resizes requested, {} failures",
            summary.volumes_discovered,
            summary.volumes_evaluated,
            summary.resizes_requested,
            summary.failures
        );
        Ok(summary)
    }

    async fn discover(&self) -> Result<Vec<LocalMount>, TickError> {
        let pods_path = PathBuf::from(&self.state.config.kubelet_pods_path);
        tokio::task::spawn_blocking(move || discover_volume_mounts(&pods_path))
            .await
            .map_err(|e| TickError::DiscoveryFailed(anyhow!("discovery task failed: {e}")))?
            .map_err(TickError::DiscoveryFailed)
    }

    /// Map each local mount to its claim UID, resolving PersistentVolume
    /// names through the cluster. Mounts that cannot be resolved are skipped.
    async fn resolve_claim_uids(&self, local: Vec<LocalMount>) -> BTreeMap<String, PathBuf> {
        let mut mounts = BTreeMap::new();
        for mount in local {
            let uid = match mount.source {
                MountSource::ClaimUid(uid) => uid,
                MountSource::PersistentVolume(name) => {
                    match self.cluster.claim_uid_for_volume(&name).await {
                        Ok(Some(uid)) => uid,
                        Ok(None) => {
                            debug!("PV '{}' has no claimRef, skipping", name);
                            continue;
                        }
                        Err(e) => {
                            warn!("Could not resolve PV '{}': {:#}", name, e);
                            continue;
                        }
                    }
                }
            };
            mounts.entry(uid).or_insert(mount.mount_path);
        }
        mounts
    }

    /// Evaluate and apply one volume. Returns whether a resize was requested.
    pub(super) async fn process_volume(
        &self,
        claim: &ClaimSnapshot,
        scaler: &VolumeScaler,
        mount_path: Option<&Path>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let snapshot = match claim_snapshot(claim) {
            Ok(snapshot) => snapshot,
            Err((quantity, err)) => {
                self.notify(
                    scaler,
                    Notice::warning(
                        "InvalidClaimSize",
                        format!(
                            "PVC '{}/{}' has unparsable storage quantity '{}'",
                            claim.namespace, claim.name, quantity
                        ),
                    ),
                )
                .await;
                return Err(err).context("reading PVC storage quantities");
            }
        };

        let resize_failure = if snapshot.resize_pending() {
            self.latest_failure(claim).await
        } else {
            None
        };

        let status = scaler.status.clone().unwrap_or_default();
        let input = VolumeInput {
            spec: &scaler.spec,
            status: &status,
            snapshot,
            mount_path,
            resize_failure,
        };
        let evaluation = self.engine.evaluate(&input, now);

        self.apply(claim, scaler, snapshot, &evaluation, now).await
    }

    async fn latest_failure(&self, claim: &ClaimSnapshot) -> Option<String> {
        match self.cluster.claim_signals(&claim.namespace, &claim.name).await {
            Ok(signals) => latest_resize_failure(&signals),
            Err(e) => {
                error!("Listing events for PVC '{}/{}' failed: {:#}", claim.namespace, claim.name, e);
                None
            }
        }
    }
}

/// Requested and reported sizes in GiB. A missing reported capacity reads as 0.
/// On failure, returns the offending quantity alongside the error.
fn claim_snapshot(claim: &ClaimSnapshot) -> Result<VolumeSnapshot, (&str, ScalingError)> {
    let requested_gib = to_gib(&claim.requested).map_err(|e| (claim.requested.as_str(), e))?;
    let reported_gib = match &claim.reported {
        Some(q) => to_gib(q).map_err(|e| (q.as_str(), e))?,
        None => 0.0,
    };
    Ok(VolumeSnapshot { requested_gib, reported_gib })
}

/// Index scalers by `<namespace>/<pvcName>`. The first scaler for a claim wins.
fn index_scalers(scalers: &[VolumeScaler]) -> HashMap<String, &VolumeScaler> {
    let mut index: HashMap<String, &VolumeScaler> = HashMap::new();
    for scaler in scalers {
        let namespace = scaler.namespace().unwrap_or_default();
        let key = scaler_key(&namespace, &scaler.spec.pvc_name);
        if let Some(existing) = index.get(&key) {
            warn!(
                "VolumeScaler {}/{} targets PVC already handled by {}, ignoring",
                namespace,
                scaler.name_any(),
                existing.name_any()
            );
            continue;
        }
        index.insert(key, scaler);
    }
    index
}
