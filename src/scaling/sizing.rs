use super::error::ScalingError;
use super::units::{to_gib, to_ratio};
use serde::Serialize;

/// How a `VolumeScaler` grows its claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScaleStrategy {
    /// Add a fixed amount such as `2Gi`.
    Fixed,
    /// Add a share of the current size such as `30%`.
    Percentage,
}

impl ScaleStrategy {
    /// Map the `scaleType` label onto a strategy.
    ///
    /// Only `fixed` selects [`ScaleStrategy::Fixed`]. Every other label,
    /// including an empty one, grows by percentage.
    pub(crate) fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("fixed") {
            Self::Fixed
        } else {
            Self::Percentage
        }
    }
}

/// Compute the next requested capacity in GiB. The result is not clamped.
pub(crate) fn compute_new_capacity(
    scale: &str,
    strategy: ScaleStrategy,
    current_gib: f64,
) -> Result<f64, ScalingError> {
    match strategy {
        ScaleStrategy::Fixed => Ok(current_gib + to_gib(scale)?),
        ScaleStrategy::Percentage => Ok(current_gib + current_gib * to_ratio(scale)?),
    }
}
