mod cooldown;
mod error;
mod sizing;
mod units;

pub(crate) use cooldown::{can_scale_now, parse_cooldown};
pub(crate) use error::ScalingError;
pub(crate) use sizing::{compute_new_capacity, ScaleStrategy};
pub(crate) use units::{format_size, parse_percent, to_gib, to_ratio};
