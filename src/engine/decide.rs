use super::types::{Decision, Evaluation, IdleReason, Measurement, PolicyField, VolumeInput};
use crate::node::UsageSampler;
use crate::scaling::{
    can_scale_now, compute_new_capacity, parse_cooldown, parse_percent, to_gib, ScaleStrategy,
    ScalingError,
};
use chrono::{DateTime, Utc};

fn invalid(field: PolicyField, err: &ScalingError) -> Decision {
    Decision::InvalidPolicy { field, detail: err.to_string() }
}

/// Turns one volume's policy, status, capacities and usage into a [`Decision`].
///
/// Holds no state between calls; the only memory is the status passed in.
#[derive(Debug, Clone)]
pub(crate) struct DecisionEngine<S> {
    sampler: S,
}

impl<S: UsageSampler> DecisionEngine<S> {
    pub(crate) const fn new(sampler: S) -> Self {
        Self { sampler }
    }

    /// Evaluate a volume. Checks run in a fixed order and the first that
    /// applies wins:
    ///
    /// 1. threshold and max size must parse
    /// 2. usage is measured (failure leaves it unmeasured, not zero)
    /// 3. settled at or above max size
    /// 4. a flagged resize has completed, or a resize is still pending
    /// 5. usage against threshold, then cooldown, then the new size
    pub(crate) fn evaluate(&self, input: &VolumeInput<'_>, now: DateTime<Utc>) -> Evaluation {
        let spec = input.spec;

        let threshold = match parse_percent(&spec.threshold) {
            Ok(v) => v,
            Err(e) => return policy_rejected(invalid(PolicyField::Threshold, &e)),
        };
        let max_gib = match to_gib(&spec.max_size) {
            Ok(v) => v,
            Err(e) => return policy_rejected(invalid(PolicyField::MaxSize, &e)),
        };

        let measurement = self.measure(input);
        let decision = decide(input, threshold, max_gib, measurement.sample().map(|s| s.percent), now);
        Evaluation { decision, measurement }
    }

    fn measure(&self, input: &VolumeInput<'_>) -> Measurement {
        let Some(path) = input.mount_path else {
            return Measurement::MountNotFound;
        };
        match self.sampler.measure(path, input.snapshot.requested_gib) {
            Ok(sample) => Measurement::Sampled(sample),
            Err(e) => Measurement::Failed(e.to_string()),
        }
    }
}

const fn policy_rejected(decision: Decision) -> Evaluation {
    Evaluation { decision, measurement: Measurement::Skipped }
}

fn decide(
    input: &VolumeInput<'_>,
    threshold: f64,
    max_gib: f64,
    usage_percent: Option<i64>,
    now: DateTime<Utc>,
) -> Decision {
    let snapshot = input.snapshot;
    let requested = snapshot.requested_gib;

    if requested >= max_gib && snapshot.settled() {
        return Decision::ReachedMaxSize { max_gib };
    }

    if input.status.resize_in_progress && snapshot.settled() {
        return Decision::ResizeComplete { reached_max: requested >= max_gib };
    }
    if snapshot.resize_pending() {
        return Decision::StillResizing { failure_reason: input.resize_failure.clone() };
    }

    let Some(percent) = usage_percent else {
        return Decision::NoAction { reason: IdleReason::Unmeasured };
    };
    if (percent as f64) < threshold {
        return Decision::NoAction { reason: IdleReason::BelowThreshold { threshold } };
    }

    let spec = input.spec;
    let cooldown = match parse_cooldown(&spec.cooldown_period) {
        Ok(d) => d,
        Err(e) => return invalid(PolicyField::CooldownPeriod, &e),
    };
    match can_scale_now(input.status.scaled_at.as_deref(), cooldown, now) {
        Ok(true) => {}
        Ok(false) => return Decision::CooldownActive,
        Err(e) => return invalid(PolicyField::ScaledAt, &e),
    }

    let strategy = ScaleStrategy::from_label(&spec.scale_type);
    let candidate = match compute_new_capacity(&spec.scale, strategy, requested) {
        Ok(v) => v.min(max_gib),
        Err(e) => return invalid(PolicyField::Scale, &e),
    };

    if candidate <= requested {
        if requested >= max_gib {
            return Decision::ReachedMaxSize { max_gib };
        }
        return Decision::NoAction { reason: IdleReason::NoNetGrowth { candidate_gib: candidate } };
    }

    Decision::RequestResize { new_capacity_gib: candidate }
}
