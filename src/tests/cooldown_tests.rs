use crate::scaling::{can_scale_now, parse_cooldown, ScalingError};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use std::time::Duration;

const TEN_MINUTES: Duration = Duration::from_secs(600);

fn minutes_ago(minutes: i64) -> String {
    (Utc::now() - ChronoDuration::minutes(minutes)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[test]
fn test_parse_cooldown() {
    assert_eq!(parse_cooldown("10m"), Ok(TEN_MINUTES));
    assert_eq!(parse_cooldown(""), Ok(Duration::ZERO));
    assert_eq!(parse_cooldown("2h"), Ok(Duration::from_secs(7200)));
    assert_eq!(parse_cooldown("1h30m"), Ok(Duration::from_secs(5400)));
    assert_eq!(parse_cooldown("1500ms"), Ok(Duration::from_millis(1500)));
    assert_eq!(parse_cooldown("invalid"), Err(ScalingError::InvalidDuration("invalid".to_string())));
    assert!(parse_cooldown("10").is_err());
    assert!(parse_cooldown("10m junk").is_err());
}

#[test]
fn test_never_scaled_can_scale() {
    assert_eq!(can_scale_now(None, TEN_MINUTES, Utc::now()), Ok(true));
    assert_eq!(can_scale_now(Some(""), TEN_MINUTES, Utc::now()), Ok(true));
}

#[test]
fn test_zero_cooldown_ignores_timestamp() {
    assert_eq!(can_scale_now(Some("not a time"), Duration::ZERO, Utc::now()), Ok(true));
    assert_eq!(can_scale_now(Some(&minutes_ago(0)), Duration::ZERO, Utc::now()), Ok(true));
}

#[test]
fn test_in_cooldown() {
    assert_eq!(can_scale_now(Some(&minutes_ago(5)), TEN_MINUTES, Utc::now()), Ok(false));
}

#[test]
fn test_cooldown_expired() {
    assert_eq!(can_scale_now(Some(&minutes_ago(15)), TEN_MINUTES, Utc::now()), Ok(true));
}

#[test]
fn test_invalid_timestamp_is_an_error() {
    assert_eq!(
        can_scale_now(Some("invalid"), TEN_MINUTES, Utc::now()),
        Err(ScalingError::InvalidTimestamp("invalid".to_string()))
    );
}
