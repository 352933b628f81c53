mod decide;
mod types;

pub(crate) use decide::DecisionEngine;
pub(crate) use types::{Decision, Evaluation, IdleReason, Measurement, PolicyField, VolumeInput, VolumeSnapshot};
