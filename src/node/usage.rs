use super::disk_space::get_disk_space;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A usage measurement taken relative to the claim's requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct UsageSample {
    /// `floor(used / requested * 100)`.
    pub percent: i64,
    /// Used space rounded to the nearest GiB.
    pub used_gib: i64,
}

impl UsageSample {
    /// Build a sample from raw GiB figures.
    pub(crate) fn from_used_gib(used_gib: f64, requested_gib: f64) -> Result<Self, UsageError> {
        if requested_gib.is_nan() || requested_gib <= 0.0 {
            return Err(UsageError::NoCapacity(requested_gib));
        }
        Ok(Self {
            percent: (used_gib / requested_gib * 100.0).floor() as i64,
            used_gib: (used_gib + 0.5).floor() as i64,
        })
    }
}

#[derive(Debug, Error)]
pub(crate) enum UsageError {
    #[error("mount path '{}' not found", .0.display())]
    MountMissing(PathBuf),

    #[error("statvfs failed for '{}': {source}", path.display())]
    Statvfs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("requested capacity {0}Gi leaves no basis for a usage ratio")]
    NoCapacity(f64),
}

/// Measures how full a mounted volume is.
///
/// Failures are never reported as zero usage.
pub(crate) trait UsageSampler {
    fn measure(&self, mount_path: &Path, requested_gib: f64) -> Result<UsageSample, UsageError>;
}

/// Samples usage from the live filesystem through `statvfs`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StatvfsSampler;

impl UsageSampler for StatvfsSampler {
    fn measure(&self, mount_path: &Path, requested_gib: f64) -> Result<UsageSample, UsageError> {
        if !mount_path.exists() {
            return Err(UsageError::MountMissing(mount_path.to_path_buf()));
        }
        let space = get_disk_space(mount_path)
            .map_err(|source| UsageError::Statvfs { path: mount_path.to_path_buf(), source })?;
        debug!(
            "statvfs {}: used={} total={} requested={:.2}Gi",
            mount_path.display(),
            space.used,
            space.total,
            requested_gib
        );

        UsageSample::from_used_gib(space.used as f64 / BYTES_PER_GIB, requested_gib)
    }
}
