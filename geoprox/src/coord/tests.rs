//! Tests for coordinate validation

use super::*;

#[test]
fn test_san_francisco_is_valid() {
    let coord = validate(37.7749, -122.4194).unwrap();
    assert_eq!(coord.latitude(), 37.7749);
    assert_eq!(coord.longitude(), -122.4194);
}

#[test]
fn test_latitude_just_past_north_pole() {
    let result = validate(91.0, 0.0);
    assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
}

#[test]
fn test_longitude_just_past_antimeridian() {
    let result = validate(0.0, 181.0);
    assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
}

#[test]
fn test_inclusive_upper_bounds() {
    assert!(validate(90.0, 180.0).is_ok());
}

#[test]
fn test_inclusive_lower_bounds() {
    assert!(validate(-90.0, -180.0).is_ok());
}

#[test]
fn test_nan_rejected() {
    assert!(matches!(
        validate(f64::NAN, 0.0),
        Err(CoordError::NonFinite { .. })
    ));
    assert!(matches!(
        validate(0.0, f64::NAN),
        Err(CoordError::NonFinite { .. })
    ));
}

#[test]
fn test_infinity_rejected() {
    assert!(matches!(
        validate(f64::INFINITY, 0.0),
        Err(CoordError::NonFinite { .. })
    ));
    assert!(matches!(
        validate(0.0, f64::NEG_INFINITY),
        Err(CoordError::NonFinite { .. })
    ));
}

#[test]
fn test_zero_zero_is_a_real_place() {
    // Gulf of Guinea, not "missing"
    let coord = validate(0.0, 0.0).unwrap();
    assert_eq!(coord.as_tuple(), (0.0, 0.0));
    assert_eq!(validate_optional(Some(0.0), Some(0.0)), Ok(Some(coord)));
}

#[test]
fn test_negative_zero_normalised() {
    let a = validate(-0.0, -0.0).unwrap();
    let b = validate(0.0, 0.0).unwrap();
    assert_eq!(a, b);
    assert!(a.latitude().is_sign_positive());
}

#[test]
fn test_optional_both_absent() {
    assert_eq!(validate_optional(None, None), Ok(None));
}

#[test]
fn test_optional_partial_is_absent() {
    assert_eq!(validate_optional(Some(10.0), None), Ok(None));
    assert_eq!(validate_optional(None, Some(10.0)), Ok(None));
}

#[test]
fn test_optional_out_of_range_still_fails() {
    assert!(validate_optional(Some(100.0), Some(0.0)).is_err());
}

#[test]
fn test_error_display_mentions_range() {
    let msg = CoordError::InvalidLatitude(91.0).to_string();
    assert!(msg.contains("91"));
    assert!(msg.contains("-90"));
}

#[test]
fn test_deserialize_validates() {
    let ok: Coordinate = serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5}"#).unwrap();
    assert_eq!(ok.as_tuple(), (1.5, 2.5));

    let bad = serde_json::from_str::<Coordinate>(r#"{"latitude": 95.0, "longitude": 2.5}"#);
    assert!(bad.is_err());
}

#[test]
fn test_try_from_tuple() {
    let coord = Coordinate::try_from((51.5074, -0.1278)).unwrap();
    assert_eq!(coord.latitude(), 51.5074);
    assert!(Coordinate::try_from((0.0, 200.0)).is_err());
}
