use super::discovery_tests::make_mount;
use super::fakes::{claim, default_spec, scaler, FakeCluster, FixedSampler};
use crate::cluster::{FailureSignal, VolumeScalerStatus, RESIZE_FAILED_REASON};
use crate::config::AppConfig;
use crate::events::EventHub;
use crate::reconciler::{Reconciler, TickError};
use crate::AppState;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn state_for(pods: &Path) -> Arc<AppState> {
    let config = AppConfig {
        kubelet_pods_path: pods.to_string_lossy().to_string(),
        ..AppConfig::default()
    };
    Arc::new(AppState::new(config, EventHub::new(16)))
}

/// Pods dir with one mounted claim `uid-1`.
fn node_with_one_mount() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    make_mount(dir.path(), "pod1", "pvc-uid-1");
    dir
}

#[tokio::test]
async fn test_tick_requests_resize() {
    let pods = node_with_one_mount();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(80), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.volumes_discovered, 1);
    assert_eq!(summary.volumes_evaluated, 1);
    assert_eq!(summary.resizes_requested, 1);
    assert_eq!(summary.failures, 0);

    let cluster = reconciler.cluster();
    assert_eq!(
        cluster.claim_patches(),
        vec![("default".to_string(), "data".to_string(), "7Gi".to_string())]
    );
    let patches = cluster.status_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].1, "data-scaler");
    assert_eq!(patches[0].2.resize_in_progress, Some(true));
    assert_eq!(patches[0].2.last_requested_size.as_deref(), Some("7Gi"));
    assert_eq!(cluster.notice_reasons(), vec!["ResizeRequested"]);
}

#[tokio::test]
async fn test_tick_marks_max_size() {
    let pods = node_with_one_mount();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "10Gi", "10Gi")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(95), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.resizes_requested, 0);

    let cluster = reconciler.cluster();
    assert!(cluster.claim_patches().is_empty());
    assert_eq!(cluster.status_patches()[0].2.reached_max_size, Some(true));
    assert_eq!(cluster.notice_reasons(), vec!["AtMaxSize"]);
}

#[tokio::test]
async fn test_tick_cooldown_leaves_status_alone() {
    let pods = node_with_one_mount();
    let mut spec = default_spec();
    spec.cooldown_period = "10m".to_string();
    let status = VolumeScalerStatus {
        scaled_at: Some((Utc::now() - chrono::Duration::minutes(5)).to_rfc3339()),
        ..VolumeScalerStatus::default()
    };
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", spec, status)],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(80), state_for(pods.path()));

    reconciler.reconcile_once(Utc::now()).await.unwrap();

    let cluster = reconciler.cluster();
    assert!(cluster.claim_patches().is_empty());
    assert!(cluster.status_patches().is_empty());
    assert_eq!(cluster.notice_reasons(), vec!["CooldownActive"]);
}

#[tokio::test]
async fn test_tick_reports_resize_failure_reason() {
    let pods = node_with_one_mount();
    let status = VolumeScalerStatus { resize_in_progress: true, ..VolumeScalerStatus::default() };
    let failure = FailureSignal {
        warning: true,
        reason: RESIZE_FAILED_REASON.to_string(),
        message: "volume quota exceeded".to_string(),
        last_seen: Some(Utc::now()),
        created: None,
    };
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "7Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), status)],
        signals: HashMap::from([("data".to_string(), vec![failure])]),
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(80), state_for(pods.path()));

    reconciler.reconcile_once(Utc::now()).await.unwrap();

    let cluster = reconciler.cluster();
    let notices = cluster.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].reason, "StillResizing");
    assert!(notices[0].message.contains("due to 'volume quota exceeded'"));
    assert!(cluster.status_patches().is_empty());
}

#[tokio::test]
async fn test_tick_resolves_persistent_volume_names() {
    let pods = tempfile::tempdir().unwrap();
    make_mount(pods.path(), "pod1", "static-pv");
    make_mount(pods.path(), "pod2", "orphan-pv");
    let cluster = FakeCluster {
        claims: vec![claim("uid-9", "apps", "logs", "5Gi", "5Gi")],
        scalers: vec![{
            let mut spec = default_spec();
            spec.pvc_name = "logs".to_string();
            scaler("apps", "logs-scaler", spec, VolumeScalerStatus::default())
        }],
        volume_claims: HashMap::from([("static-pv".to_string(), "uid-9".to_string())]),
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(75), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.volumes_discovered, 1);
    assert_eq!(summary.resizes_requested, 1);
    assert_eq!(
        reconciler.cluster().claim_patches(),
        vec![("apps".to_string(), "logs".to_string(), "7Gi".to_string())]
    );
}

#[tokio::test]
async fn test_tick_skips_unmatched_volumes() {
    let pods = tempfile::tempdir().unwrap();
    make_mount(pods.path(), "pod1", "pvc-uid-1");
    make_mount(pods.path(), "pod2", "pvc-uid-unknown");
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        // Scaler in another namespace does not match.
        scalers: vec![scaler("other", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(99), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.volumes_discovered, 2);
    assert_eq!(summary.volumes_evaluated, 0);
    assert!(reconciler.cluster().notices().is_empty());
}

#[tokio::test]
async fn test_patch_failure_does_not_stop_other_volumes() {
    let pods = tempfile::tempdir().unwrap();
    make_mount(pods.path(), "pod1", "pvc-uid-1");
    make_mount(pods.path(), "pod2", "pvc-uid-2");
    let mut second = default_spec();
    second.pvc_name = "cache".to_string();
    let cluster = FakeCluster {
        claims: vec![
            claim("uid-1", "default", "data", "5Gi", "5Gi"),
            claim("uid-2", "default", "cache", "5Gi", "5Gi"),
        ],
        scalers: vec![
            scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default()),
            scaler("default", "cache-scaler", second, VolumeScalerStatus::default()),
        ],
        reject_claim_patch: vec!["data".to_string()],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(90), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.volumes_evaluated, 2);
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.resizes_requested, 1);

    let cluster = reconciler.cluster();
    assert_eq!(
        cluster.claim_patches(),
        vec![("default".to_string(), "cache".to_string(), "7Gi".to_string())]
    );
    assert_eq!(cluster.status_patches().len(), 1);
    let reasons = cluster.notice_reasons();
    assert!(reasons.contains(&"ResizeFailed"));
    assert!(reasons.contains(&"ResizeRequested"));
}

#[tokio::test]
async fn test_invalid_policy_is_reported() {
    let pods = node_with_one_mount();
    let mut spec = default_spec();
    spec.threshold = "high".to_string();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", spec, VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(90), state_for(pods.path()));

    reconciler.reconcile_once(Utc::now()).await.unwrap();

    let cluster = reconciler.cluster();
    assert_eq!(cluster.notice_reasons(), vec!["InvalidThreshold"]);
    assert!(cluster.status_patches().is_empty());
    assert!(cluster.claim_patches().is_empty());
}

#[tokio::test]
async fn test_measure_failure_is_reported_but_not_fatal() {
    let pods = node_with_one_mount();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::failing(), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.failures, 0);
    assert_eq!(reconciler.cluster().notice_reasons(), vec!["MeasureFailed"]);
}

#[tokio::test]
async fn test_discovery_failure_aborts_tick() {
    let dir = tempfile::tempdir().unwrap();
    let reconciler = Reconciler::new(
        FakeCluster::default(),
        FixedSampler::percent(90),
        state_for(&dir.path().join("missing")),
    );

    let err = reconciler.reconcile_once(Utc::now()).await.unwrap_err();
    assert!(matches!(err, TickError::DiscoveryFailed(_)));
}

#[tokio::test]
async fn test_list_failure_aborts_tick() {
    let pods = node_with_one_mount();
    let cluster = FakeCluster { fail_list_claims: true, ..FakeCluster::default() };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(90), state_for(pods.path()));

    let err = reconciler.reconcile_once(Utc::now()).await.unwrap_err();
    assert!(matches!(err, TickError::ListFailed { what: "PVCs", .. }));
}

#[tokio::test]
async fn test_run_stops_when_cancelled() {
    let pods = node_with_one_mount();
    let state = state_for(pods.path());
    let reconciler = Reconciler::new(FakeCluster::default(), FixedSampler::percent(10), Arc::clone(&state));
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();

    reconciler.run(cancel).await;
    assert!(state.status.read().await.last_tick.is_none());
}

#[tokio::test]
async fn test_tick_publishes_volume_events() {
    let pods = node_with_one_mount();
    let state = state_for(pods.path());
    let mut rx = state.event_hub.subscribe();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(40), state);

    reconciler.reconcile_once(Utc::now()).await.unwrap();

    match rx.try_recv().unwrap() {
        crate::events::Event::VolumeEvaluated { scaler, claim, usage, .. } => {
            assert_eq!(scaler, "data-scaler");
            assert_eq!(claim, "data");
            assert_eq!(usage.map(|u| u.percent), Some(40));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_claim_size_is_reported_on_scaler() {
    let pods = node_with_one_mount();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5G", "5G")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(95), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.resizes_requested, 0);

    let cluster = reconciler.cluster();
    let notices = cluster.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].reason, "InvalidClaimSize");
    assert!(notices[0].message.contains("'5G'"));
    assert!(cluster.claim_patches().is_empty());
}

#[tokio::test]
async fn test_status_patch_failure_is_reported_on_scaler() {
    let pods = node_with_one_mount();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", default_spec(), VolumeScalerStatus::default())],
        reject_status_patch: true,
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(80), state_for(pods.path()));

    let summary = reconciler.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(summary.failures, 1);

    let cluster = reconciler.cluster();
    // The claim was already grown when the status write failed.
    assert_eq!(cluster.claim_patches().len(), 1);
    assert_eq!(cluster.notice_reasons(), vec!["ResizeRequested", "StatusUpdateFailed"]);
}

#[tokio::test]
async fn test_fractional_growth_patches_claim_in_mebibytes() {
    let pods = node_with_one_mount();
    let mut spec = default_spec();
    spec.scale = "512Mi".to_string();
    let cluster = FakeCluster {
        claims: vec![claim("uid-1", "default", "data", "5Gi", "5Gi")],
        scalers: vec![scaler("default", "data-scaler", spec, VolumeScalerStatus::default())],
        ..FakeCluster::default()
    };
    let reconciler = Reconciler::new(cluster, FixedSampler::percent(90), state_for(pods.path()));

    reconciler.reconcile_once(Utc::now()).await.unwrap();

    let cluster = reconciler.cluster();
    assert_eq!(
        cluster.claim_patches(),
        vec![("default".to_string(), "data".to_string(), "5632Mi".to_string())]
    );
    assert_eq!(cluster.status_patches()[0].2.last_requested_size.as_deref(), Some("5632Mi"));
}
