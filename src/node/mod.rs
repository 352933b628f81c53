pub(crate) mod discovery;
mod disk_space;
mod usage;

pub(crate) use discovery::{discover_volume_mounts, LocalMount, MountSource};
pub(crate) use usage::{StatvfsSampler, UsageError, UsageSample, UsageSampler};
