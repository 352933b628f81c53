/// Default path of the optional daemon config file.
pub(super) const DEFAULT_CONFIG_PATH: &str = "/etc/volumescaler/volumescaler.cfg";

/// Where the kubelet keeps per-pod volume mounts.
pub(super) const DEFAULT_KUBELET_PODS_PATH: &str = "/var/lib/kubelet/pods";

/// Seconds between reconcile ticks.
pub(super) const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Upper bound for the poll interval (one day).
pub(super) const MAX_POLL_INTERVAL_SECS: u64 = 86_400;

/// Port for the status and health endpoints.
pub(super) const DEFAULT_PORT: u16 = 7095;

/// Source component recorded on emitted events.
pub(super) const DEFAULT_EVENT_COMPONENT: &str = "volumescaler-controller";
