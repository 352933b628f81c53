use super::error::ScalingError;

/// Convert a size string such as `5Gi`, `512Mi` or `1Ti` into GiB.
///
/// A bare number is already GiB. Empty input, a missing numeric part or an
/// unknown suffix is rejected.
pub(crate) fn to_gib(size: &str) -> Result<f64, ScalingError> {
    let invalid = || ScalingError::InvalidSize(size.to_string());

    let split = size.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    if number.is_empty() {
        return Err(invalid());
    }

    let value: f64 = number.parse().map_err(|_| invalid())?;
    match unit {
        "" | "Gi" => Ok(value),
        "Mi" => Ok(value / 1024.0),
        "Ti" => Ok(value * 1024.0),
        _ => Err(invalid()),
    }
}

/// Parse `70%` (or plain `70`) into `70.0`.
pub(crate) fn parse_percent(percent: &str) -> Result<f64, ScalingError> {
    let trimmed = percent.strip_suffix('%').unwrap_or(percent).trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScalingError::InvalidPercentage(percent.to_string()))
}

/// Parse `20%` into the ratio `0.2`.
pub(crate) fn to_ratio(percent: &str) -> Result<f64, ScalingError> {
    parse_percent(percent).map(|p| p / 100.0)
}

/// Render a GiB amount the way sizes are written back to the cluster:
/// whole GiB as `7Gi`, anything finer as whole MiB rounded up.
pub(crate) fn format_size(gib: f64) -> String {
    if (gib - gib.round()).abs() < 1e-9 {
        format!("{:.0}Gi", gib.round())
    } else {
        // Float noise just above a whole MiB must not add another one.
        format!("{:.0}Mi", (gib * 1024.0 - 1e-6).ceil())
    }
}
