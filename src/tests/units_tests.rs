use crate::scaling::{format_size, parse_percent, to_gib, to_ratio, ScalingError};

#[test]
fn test_to_gib_units() {
    assert_eq!(to_gib("5Gi"), Ok(5.0));
    assert_eq!(to_gib("1024Mi"), Ok(1.0));
    assert_eq!(to_gib("512Mi"), Ok(0.5));
    assert_eq!(to_gib("1Ti"), Ok(1024.0));
    assert_eq!(to_gib("1.5Gi"), Ok(1.5));
}

#[test]
fn test_to_gib_bare_number_is_gib() {
    assert_eq!(to_gib("5"), Ok(5.0));
}

#[test]
fn test_to_gib_rejects_garbage() {
    assert_eq!(to_gib(""), Err(ScalingError::InvalidSize(String::new())));
    assert_eq!(to_gib("5Xi"), Err(ScalingError::InvalidSize("5Xi".to_string())));
    assert!(to_gib("invalid").is_err());
    assert!(to_gib("Gi").is_err());
    assert!(to_gib("-5Gi").is_err());
    assert!(to_gib("5G").is_err());
}

#[test]
fn test_parse_percent() {
    assert_eq!(parse_percent("70%"), Ok(70.0));
    assert_eq!(parse_percent("70.5%"), Ok(70.5));
    assert_eq!(parse_percent("0%"), Ok(0.0));
    assert_eq!(parse_percent("70"), Ok(70.0));
    assert!(parse_percent("invalid%").is_err());
    assert!(parse_percent("").is_err());
    assert!(parse_percent("%").is_err());
}

#[test]
fn test_to_ratio() {
    assert!((to_ratio("20%").unwrap() - 0.2).abs() < f64::EPSILON);
    assert!(matches!(to_ratio("abc"), Err(ScalingError::InvalidPercentage(_))));
}

#[test]
fn test_format_size() {
    assert_eq!(format_size(7.0), "7Gi");
    assert_eq!(format_size(12.0), "12Gi");
    assert_eq!(format_size(0.5), "512Mi");
}
