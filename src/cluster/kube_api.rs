use super::api::{ClaimSnapshot, ClusterApi, Notice, StatusPatch};
use super::crd::VolumeScaler;
use super::signals::FailureSignal;
use anyhow::{Context, Result};
use chrono::Utc;
use k8s_openapi::api::core::v1::{
    Event, EventSource, ObjectReference, PersistentVolume, PersistentVolumeClaim,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

const STORAGE: &str = "storage";

/// [`ClusterApi`] backed by a live Kubernetes API server.
#[derive(Clone)]
pub(crate) struct KubeCluster {
    client: Client,
    component: String,
    node_name: Option<String>,
}

impl KubeCluster {
    /// Connect using `KUBECONFIG` when set, the in-cluster service account otherwise.
    pub(crate) async fn connect(component: &str, node_name: Option<String>) -> Result<Self> {
        let config = if let Ok(path) = std::env::var("KUBECONFIG") {
            info!("Using kubeconfig at {}", path);
            let kubeconfig = Kubeconfig::read_from(&path)
                .with_context(|| format!("Failed to read kubeconfig {path}"))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Failed to load kubeconfig")?
        } else {
            info!("Using in-cluster configuration");
            Config::incluster().context("Failed to load in-cluster configuration")?
        };

        let client = Client::try_from(config).context("Failed to build Kubernetes client")?;
        Ok(Self { client, component: component.to_string(), node_name })
    }

    fn involved_object(scaler: &VolumeScaler) -> ObjectReference {
        ObjectReference {
            api_version: Some(VolumeScaler::api_version(&()).to_string()),
            kind: Some(VolumeScaler::kind(&()).to_string()),
            namespace: scaler.namespace(),
            name: Some(scaler.name_any()),
            uid: scaler.uid(),
            ..ObjectReference::default()
        }
    }
}

fn claim_snapshot(pvc: PersistentVolumeClaim) -> Option<ClaimSnapshot> {
    let requested = pvc
        .spec
        .as_ref()
        .and_then(|s| s.resources.as_ref())
        .and_then(|r| r.requests.as_ref())
        .and_then(|r| r.get(STORAGE))
        .map(|q| q.0.clone())?;
    let reported = pvc
        .status
        .as_ref()
        .and_then(|s| s.capacity.as_ref())
        .and_then(|c| c.get(STORAGE))
        .map(|q| q.0.clone());

    Some(ClaimSnapshot {
        uid: pvc.metadata.uid?,
        namespace: pvc.metadata.namespace?,
        name: pvc.metadata.name?,
        requested,
        reported,
    })
}

fn failure_signal(event: Event) -> FailureSignal {
    FailureSignal {
        warning: event.type_.as_deref() == Some("Warning"),
        reason: event.reason.unwrap_or_default(),
        message: event.message.unwrap_or_default(),
        last_seen: event.last_timestamp.map(|t| t.0),
        created: event.metadata.creation_timestamp.map(|t| t.0),
    }
}

impl ClusterApi for KubeCluster {
    async fn list_claims(&self) -> Result<Vec<ClaimSnapshot>> {
        let api: Api<PersistentVolumeClaim> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await.context("listing PVCs")?;
        Ok(list.items.into_iter().filter_map(claim_snapshot).collect())
    }

    async fn list_scalers(&self) -> Result<Vec<VolumeScaler>> {
        let api: Api<VolumeScaler> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await.context("listing VolumeScalers")?;
        Ok(list.items)
    }

    async fn claim_uid_for_volume(&self, volume_name: &str) -> Result<Option<String>> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        let pv = api
            .get_opt(volume_name)
            .await
            .with_context(|| format!("Could not get PV '{volume_name}'"))?;
        Ok(pv.and_then(|pv| pv.spec).and_then(|s| s.claim_ref).and_then(|r| r.uid))
    }

    async fn patch_claim_storage(&self, namespace: &str, claim: &str, size: &str) -> Result<()> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        let patch = json!({ "spec": { "resources": { "requests": { "storage": size } } } });
        api.patch(claim, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("patching PVC '{namespace}/{claim}'"))?;
        Ok(())
    }

    async fn patch_scaler_status(
        &self,
        namespace: &str,
        scaler: &str,
        patch: &StatusPatch,
    ) -> Result<()> {
        let api: Api<VolumeScaler> = Api::namespaced(self.client.clone(), namespace);
        let body = json!({ "status": patch });
        api.patch_status(scaler, &PatchParams::default(), &Patch::Merge(&body))
            .await
            .with_context(|| format!("patching status of VolumeScaler '{namespace}/{scaler}'"))?;
        Ok(())
    }

    async fn claim_signals(&self, namespace: &str, claim: &str) -> Result<Vec<FailureSignal>> {
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let selector =
            format!("involvedObject.kind=PersistentVolumeClaim,involvedObject.name={claim}");
        let list = api
            .list(&ListParams::default().fields(&selector))
            .await
            .with_context(|| format!("listing events for PVC '{namespace}/{claim}'"))?;
        Ok(list.items.into_iter().map(failure_signal).collect())
    }

    async fn notify(&self, scaler: &VolumeScaler, notice: &Notice) -> Result<()> {
        let namespace = scaler.namespace().unwrap_or_default();
        let now = Utc::now();
        let event = Event {
            metadata: ObjectMeta {
                name: Some(format!("{}.{}", scaler.name_any(), uuid::Uuid::new_v4().simple())),
                namespace: Some(namespace.clone()),
                ..ObjectMeta::default()
            },
            involved_object: Self::involved_object(scaler),
            type_: Some(notice.kind.as_str().to_string()),
            reason: Some(notice.reason.to_string()),
            message: Some(notice.message.clone()),
            source: Some(EventSource {
                component: Some(self.component.clone()),
                host: self.node_name.clone(),
            }),
            first_timestamp: Some(Time(now)),
            last_timestamp: Some(Time(now)),
            count: Some(1),
            ..Event::default()
        };

        let api: Api<Event> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&PostParams::default(), &event)
            .await
            .with_context(|| format!("emitting {} event", notice.reason))?;
        debug!("Emitted {} event on VolumeScaler {}/{}", notice.reason, namespace, scaler.name_any());
        Ok(())
    }
}
