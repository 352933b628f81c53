mod api;
mod crd;
mod kube_api;
mod signals;

pub(crate) use api::{ClaimSnapshot, ClusterApi, Notice, NoticeType, StatusPatch};
pub(crate) use crd::{VolumeScaler, VolumeScalerSpec, VolumeScalerStatus};
pub(crate) use kube_api::KubeCluster;
pub(crate) use signals::{latest_resize_failure, FailureSignal, RESIZE_FAILED_REASON};
