//! Property-based tests for national-number canonicalization.
//!
//! These tests verify:
//! - Canonicalization is idempotent
//! - Output is always `MOR` followed by at most four ASCII digits
//! - The kept digits are the first digits typed, in order
//! - Any input with four or more digits canonicalizes to a valid number

use proptest::prelude::*;
use roster_core::member::{
    canonicalize_national_number, is_valid_national_number, NATIONAL_NUMBER_DIGITS,
    NATIONAL_NUMBER_PREFIX,
};

fn digits_of(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

#[test]
fn empty_input_is_bare_prefix() {
    assert_eq!(canonicalize_national_number(""), "MOR");
    assert!(!is_valid_national_number("MOR"));
}

#[test]
fn lowercase_prefix_is_recognized() {
    assert_eq!(canonicalize_national_number("mor 98-76"), "MOR9876");
}

#[test]
fn non_ascii_digits_are_dropped() {
    // Arabic-Indic digits are not ASCII digits.
    assert_eq!(canonicalize_national_number("MOR١٢٣٤"), "MOR");
}

proptest! {
    #[test]
    fn canonicalization_is_idempotent(raw in "\\PC{0,24}") {
        let once = canonicalize_national_number(&raw);
        let twice = canonicalize_national_number(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn output_shape(raw in "\\PC{0,24}") {
        let canonical = canonicalize_national_number(&raw);
        let rest = canonical.strip_prefix(NATIONAL_NUMBER_PREFIX);
        prop_assert!(rest.is_some(), "missing prefix in {}", canonical);
        let rest = rest.unwrap_or_default();
        prop_assert!(rest.len() <= NATIONAL_NUMBER_DIGITS);
        prop_assert!(rest.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn keeps_first_digits_in_order(raw in "[a-z0-9 /-]{0,24}") {
        let canonical = canonicalize_national_number(&raw);
        let expected: String = digits_of(&raw).chars().take(NATIONAL_NUMBER_DIGITS).collect();
        prop_assert_eq!(&canonical[NATIONAL_NUMBER_PREFIX.len()..], expected.as_str());
    }

    #[test]
    fn four_digits_make_a_valid_number(
        prefix in prop::sample::select(vec!["mor", "MOR", ""]),
        noise in "[a-z /-]{0,4}",
        digits in "[0-9]{4,10}",
    ) {
        let raw = format!("{prefix}{noise}{digits}");
        let canonical = canonicalize_national_number(&raw);
        prop_assert!(is_valid_national_number(&canonical), "{} -> {}", raw, canonical);
        prop_assert_eq!(&canonical[3..], &digits[..4]);
    }

    #[test]
    fn valid_numbers_are_fixed_points(digits in "[0-9]{4}") {
        let value = format!("MOR{digits}");
        prop_assert!(is_valid_national_number(&value));
        prop_assert_eq!(canonicalize_national_number(&value), value);
    }
}
