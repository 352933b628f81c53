mod apply;
mod error;
mod tick;

pub(crate) use error::TickError;

use crate::cluster::ClusterApi;
use crate::engine::DecisionEngine;
use crate::events::Event;
use crate::node::UsageSampler;
use crate::AppState;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Drives one reconcile pass per poll interval for the volumes on this node.
pub(crate) struct Reconciler<C, S> {
    cluster: C,
    engine: DecisionEngine<S>,
    state: Arc<AppState>,
}

impl<C: ClusterApi, S: UsageSampler> Reconciler<C, S> {
    pub(crate) const fn new(cluster: C, sampler: S, state: Arc<AppState>) -> Self {
        Self { cluster, engine: DecisionEngine::new(sampler), state }
    }

    #[cfg(test)]
    pub(crate) const fn cluster(&self) -> &C {
        &self.cluster
    }

    /// Run ticks until `cancel` fires.
    ///
    /// Cancellation is only observed between ticks; a running tick completes.
    pub(crate) async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(self.state.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Reconcile loop started: interval={}s, pods_path={}",
            self.state.config.poll_interval_secs, self.state.config.kubelet_pods_path
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.state.begin_tick().await;
            let started_at = Utc::now();
            let summary = match self.reconcile_once(started_at).await {
                Ok(summary) => summary,
                Err(e) => {
                    error!("Reconcile tick aborted: {}", e);
                    self.state.event_hub.publish(Event::DaemonError { message: e.to_string() });
                    tick::aborted_summary(started_at, &e)
                }
            };
            self.state.event_hub.publish(Event::TickComplete(summary.clone()));
            self.state.finish_tick(summary).await;
        }

        info!("Reconcile loop stopped");
    }
}
