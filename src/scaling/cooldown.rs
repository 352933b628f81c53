use super::error::ScalingError;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

static DURATION_PART: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::unwrap_used)]
fn duration_part() -> &'static Regex {
    DURATION_PART
        .get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?|\.\d+)(ns|us|µs|ms|s|m|h)").unwrap())
}

/// Parse a Go-style duration (`10m`, `2h`, `1h30m`, `1.5s`). Empty means no cooldown.
pub(crate) fn parse_cooldown(cooldown: &str) -> Result<Duration, ScalingError> {
    let invalid = || ScalingError::InvalidDuration(cooldown.to_string());
    let trimmed = cooldown.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_secs = 0.0_f64;
    let mut consumed = 0;
    for caps in duration_part().captures_iter(trimmed) {
        let Some(whole) = caps.get(0) else { continue };
        // Parts must be contiguous: "10mfoo5s" is not a duration.
        if whole.start() != consumed {
            return Err(invalid());
        }
        consumed = whole.end();

        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let scale = match &caps[2] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        total_secs += value * scale;
    }

    if consumed != trimmed.len() {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(total_secs).map_err(|_| invalid())
}

/// Decide whether the cooldown since `last_scaled_at` has elapsed at `now`.
///
/// A zero cooldown or a volume that was never scaled may always scale. An
/// unparsable timestamp is an error rather than a yes or a no.
pub(crate) fn can_scale_now(
    last_scaled_at: Option<&str>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> Result<bool, ScalingError> {
    if cooldown.is_zero() {
        return Ok(true);
    }
    let Some(raw) = last_scaled_at.filter(|s| !s.is_empty()) else {
        return Ok(true);
    };

    let scaled_at = DateTime::parse_from_rfc3339(raw)
        .map_err(|_| ScalingError::InvalidTimestamp(raw.to_string()))?
        .with_timezone(&Utc);

    let elapsed = now.signed_duration_since(scaled_at);
    // A timestamp in the future counts as "just scaled".
    let elapsed = elapsed.to_std().unwrap_or(Duration::ZERO);
    Ok(elapsed >= cooldown)
}
