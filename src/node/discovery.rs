use anyhow::{bail, Result};
use jwalk::{Parallelism, WalkDir};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `<pods>/<pod-uid>/volumes/kubernetes.io~csi/<volume>/mount`
const MOUNT_DEPTH: usize = 5;
const CSI_VOLUMES_SEGMENT: &str = "volumes/kubernetes.io~csi";
const CLAIM_DIR_PREFIX: &str = "pvc-";

/// How a mount directory identifies its claim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MountSource {
    /// The volume directory is `pvc-<uid>`; the claim UID is known directly.
    ClaimUid(String),
    /// The volume directory is a PersistentVolume name that still has to be
    /// resolved to its claim through `spec.claimRef`.
    PersistentVolume(String),
}

/// A CSI volume mounted under the kubelet pods directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalMount {
    pub source: MountSource,
    pub mount_path: PathBuf,
}

/// Walk the kubelet pods directory and collect every CSI volume mount.
///
/// A volume mounted into several pods is reported once.
pub(crate) fn discover_volume_mounts(pods_path: &Path) -> Result<Vec<LocalMount>> {
    if !pods_path.is_dir() {
        bail!("Kubelet pods path does not exist: {}", pods_path.display());
    }

    let mut mounts: BTreeMap<MountSource, PathBuf> = BTreeMap::new();

    let walker = WalkDir::new(pods_path)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .max_depth(MOUNT_DEPTH);

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                warn!("Error reading kubelet directory entry: {}", err);
                continue;
            }
        };

        if entry.depth != MOUNT_DEPTH
            || !entry.file_type().is_dir()
            || entry.file_name().to_str() != Some("mount")
        {
            continue;
        }

        let path = entry.path();
        if let Some(source) = classify_mount(&path) {
            debug!("Found volume mount {:?} at {}", source, path.display());
            mounts.entry(source).or_insert(path);
        }
    }

    Ok(mounts.into_iter().map(|(source, mount_path)| LocalMount { source, mount_path }).collect())
}

/// Work out which claim a `.../<volume>/mount` directory belongs to.
pub(crate) fn classify_mount(mount_path: &Path) -> Option<MountSource> {
    if !mount_path.to_string_lossy().contains(CSI_VOLUMES_SEGMENT) {
        return None;
    }

    let volume_dir = mount_path.parent()?.file_name()?.to_string_lossy().to_string();
    match volume_dir.strip_prefix(CLAIM_DIR_PREFIX) {
        Some("") => None,
        Some(uid) => Some(MountSource::ClaimUid(uid.to_string())),
        None => Some(MountSource::PersistentVolume(volume_dir)),
    }
}
