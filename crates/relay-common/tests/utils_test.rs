//! Tests for relay-common utilities.
//!
//! These tests cover:
//! - The documented duration formatting examples
//! - Structural properties of formatted durations over arbitrary inputs

use proptest::prelude::*;
use relay_common::utils::*;

#[test]
fn test_format_duration_documented_examples() {
    assert_eq!(format_duration(0), "0 seconds");
    assert_eq!(format_duration(45), "45 seconds");
    assert_eq!(format_duration(90), "1 minute, 30 seconds");
    assert_eq!(format_duration(3661), "1 hour, 1 minute, 1 second");
    assert_eq!(format_duration(3600), "1 hour");
}

#[test]
fn test_format_duration_skips_zero_minutes() {
    assert_eq!(format_duration(7205), "2 hours, 5 seconds");
    assert_eq!(format_duration(7260), "2 hours, 1 minute");
}

/// Parses "N unit" fragments back into seconds.
fn parse_back(formatted: &str) -> u64 {
    formatted
        .split(", ")
        .map(|part| {
            let (count, unit) = part.split_once(' ').expect("count and unit");
            let count: u64 = count.parse().expect("numeric count");
            match unit {
                "hour" | "hours" => count * 3600,
                "minute" | "minutes" => count * 60,
                "second" | "seconds" => count,
                other => panic!("unexpected unit {other}"),
            }
        })
        .sum()
}

proptest! {
    #[test]
    fn prop_format_duration_preserves_total(seconds in 0u64..10_000_000) {
        prop_assert_eq!(parse_back(&format_duration(seconds)), seconds);
    }

    #[test]
    fn prop_format_duration_has_no_zero_parts(seconds in 1u64..10_000_000) {
        let formatted = format_duration(seconds);
        prop_assert!(formatted.split(", ").all(|part| !part.starts_with("0 ")));
        prop_assert!(formatted.split(", ").count() <= 3);
    }

    #[test]
    fn prop_singular_only_for_one(seconds in 0u64..10_000_000) {
        for part in format_duration(seconds).split(", ") {
            let (count, unit) = part.split_once(' ').unwrap();
            prop_assert_eq!(count == "1", !unit.ends_with('s'));
        }
    }
}
