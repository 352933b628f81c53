use crate::engine::Decision;
use crate::node::UsageSample;
use crate::state::TickSummary;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Events that flow from the reconcile loop to SSE subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub(crate) enum Event {
    /// One volume was evaluated and its decision applied.
    VolumeEvaluated {
        namespace: String,
        scaler: String,
        claim: String,
        decision: Decision,
        usage: Option<UsageSample>,
    },

    /// A reconcile tick finished (successfully or not).
    TickComplete(TickSummary),

    /// A generic error event.
    DaemonError { message: String },
}

impl Event {
    /// Returns the SSE event type name for this event variant.
    pub(crate) const fn event_type(&self) -> &'static str {
        match self {
            Self::VolumeEvaluated { .. } => "volume_evaluated",
            Self::TickComplete(_) => "tick_complete",
            Self::DaemonError { .. } => "daemon_error",
        }
    }
}

/// The central event broadcast hub.
///
/// The reconcile loop sends events here via `publish()`.
/// SSE endpoint handlers subscribe via `subscribe()`.
#[derive(Debug, Clone)]
pub(crate) struct EventHub {
    sender: broadcast::Sender<Event>,
}

impl EventHub {
    /// Create a new EventHub with the given channel capacity.
    ///
    /// Subscribers that fall more than `capacity` events behind receive a
    /// `Lagged` error and miss intermediate events.
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns how many subscribers received the event. Having none is not an
    /// error; the event is dropped with a debug log.
    pub(crate) fn publish(&self, event: Event) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!("No event subscribers, dropping {}", event.event_type());
                0
            }
        }
    }

    /// Subscribe to the event stream. Returns a broadcast Receiver.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}
