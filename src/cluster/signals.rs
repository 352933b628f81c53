use chrono::{DateTime, Utc};

/// Reason code the resizer attaches to failed expansions.
pub(crate) const RESIZE_FAILED_REASON: &str = "VolumeResizeFailed";

/// A notification observed on a claim, reduced to what failure attribution needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FailureSignal {
    pub warning: bool,
    pub reason: String,
    pub message: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

impl FailureSignal {
    fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen.or(self.created)
    }
}

/// Pick the message of the most recent `VolumeResizeFailed` warning.
///
/// Signals are ordered by last-seen time (creation time when absent), then by
/// creation time. Later entries win exact ties. Returns `None` when nothing
/// matches or the message is blank.
pub(crate) fn latest_resize_failure(signals: &[FailureSignal]) -> Option<String> {
    let latest = signals
        .iter()
        .filter(|s| s.warning && s.reason == RESIZE_FAILED_REASON)
        .max_by_key(|s| (s.observed_at(), s.created))?;

    let message = latest.message.replace("(MISSING)", "");
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}
