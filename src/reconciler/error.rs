use thiserror::Error;

/// Failures that abort a whole tick. The next scheduled tick is the retry.
#[derive(Debug, Error)]
pub(crate) enum TickError {
    #[error("local mount discovery failed: {0:#}")]
    DiscoveryFailed(anyhow::Error),

    #[error("listing {what} failed: {source:#}")]
    ListFailed {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
