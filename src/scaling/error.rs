use thiserror::Error;

/// Failures parsing the string-typed fields of a `VolumeScaler`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ScalingError {
    #[error("invalid size '{0}'")]
    InvalidSize(String),

    #[error("invalid percentage '{0}'")]
    InvalidPercentage(String),

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("cannot parse scaledAt '{0}'")]
    InvalidTimestamp(String),
}
