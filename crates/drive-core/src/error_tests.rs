//! Tests for `error` module.

use super::error::*;

#[test]
fn test_error_display_config() {
    let err = Error::Config("missing row_len".to_string());
    assert_eq!(err.to_string(), "Configuration error: missing row_len");
}

#[test]
fn test_error_display_degenerate() {
    let err = Error::DegenerateInput { row: 3, norm: "l2" };
    assert_eq!(err.to_string(), "Degenerate input: l2 norm of row 3 is zero");
}

#[test]
fn test_error_display_dimension_mismatch() {
    let err = Error::DimensionMismatch {
        expected: 8,
        actual: 7,
    };
    assert_eq!(err.to_string(), "Dimension mismatch: expected 8, got 7");
}

#[test]
fn test_unsupported_bits_message_names_range() {
    let err = Error::unsupported_bits(9);
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(
        err.to_string(),
        "Configuration error: unsupported bit-width 9, expected 1..=8"
    );
}
