//! Comparison of expected and rendered text sequences.
//!
//! Pure functions, no driver involved. All of them are total: they never
//! panic and an absent sequence is simply an empty slice. Comparisons are
//! case-sensitive and order-aware where the name says so.

use crate::result::{PomError, PomResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{error, info};

/// `true` iff both sequences have the same length and equal items at every index
pub fn exact_order_match<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(e, a)| e.as_ref() == a.as_ref())
}

/// Trim every item; missing items become empty strings
pub fn trim_all<S: AsRef<str>>(items: &[Option<S>]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.as_ref().map_or_else(String::new, |s| s.as_ref().trim().to_string()))
        .collect()
}

/// Trim every item of a sequence that has no missing entries
pub fn trim_each<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|s| s.as_ref().trim().to_string()).collect()
}

/// Values occurring at least twice, each once, in order of their second occurrence
pub fn get_duplicates<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut dups = Vec::new();
    for item in items {
        let count = seen.entry(item.as_ref()).or_insert(0);
        *count += 1;
        if *count == 2 {
            dups.push(item.as_ref().to_string());
        }
    }
    dups
}

/// Whether any value occurs more than once
pub fn has_duplicates<S: AsRef<str>>(items: &[S]) -> bool {
    let mut seen = HashSet::new();
    items.iter().any(|item| !seen.insert(item.as_ref()))
}

/// Items of `expected` that do not occur anywhere in `actual`
pub fn list_missing<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> Vec<String> {
    let present: HashSet<&str> = actual.iter().map(AsRef::as_ref).collect();
    expected
        .iter()
        .map(AsRef::as_ref)
        .filter(|e| !present.contains(e))
        .map(str::to_string)
        .collect()
}

/// Items of `actual` that do not occur anywhere in `expected`
pub fn list_unexpected<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> Vec<String> {
    let wanted: HashSet<&str> = expected.iter().map(AsRef::as_ref).collect();
    actual
        .iter()
        .map(AsRef::as_ref)
        .filter(|a| !wanted.contains(a))
        .map(str::to_string)
        .collect()
}

/// Describe every expected item found in `actual` at a different index.
///
/// Each `expected[i]` is looked up at its first occurrence `j` in `actual`;
/// when `j != i` the descriptor `"value (expected @i, actual @j)"` is
/// emitted. Items absent from `actual` are left to [`list_missing`].
/// Repeated expected values are checked independently, each against that
/// same first occurrence.
pub fn list_out_of_order<E: AsRef<str>, A: AsRef<str>>(
    expected: &[E],
    actual: &[A],
) -> Vec<String> {
    let mut first_index: HashMap<&str, usize> = HashMap::new();
    for (j, a) in actual.iter().enumerate() {
        first_index.entry(a.as_ref()).or_insert(j);
    }
    expected
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            let value = e.as_ref();
            first_index
                .get(value)
                .filter(|&&j| j != i)
                .map(|j| format!("{value} (expected @{i}, actual @{j})"))
        })
        .collect()
}

// =============================================================================
// SEQUENCE DIFF
// =============================================================================

/// Full comparison report of a rendered list against its expectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceDiff {
    /// Trimmed expected values
    pub expected: Vec<String>,
    /// Trimmed actual values
    pub actual: Vec<String>,
    /// Values repeated in the rendered list
    pub duplicates: Vec<String>,
    /// Expected values not rendered
    pub missing: Vec<String>,
    /// Rendered values not expected
    pub unexpected: Vec<String>,
    /// Misplaced values, see [`list_out_of_order`]
    pub out_of_order: Vec<String>,
}

impl SequenceDiff {
    /// Compare after trimming both sides
    pub fn compute<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> Self {
        let expected = trim_each(expected);
        let actual = trim_each(actual);
        Self {
            duplicates: get_duplicates(&actual),
            missing: list_missing(&expected, &actual),
            unexpected: list_unexpected(&expected, &actual),
            out_of_order: list_out_of_order(&expected, &actual),
            expected,
            actual,
        }
    }

    /// Exact order match with no duplicates rendered
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.duplicates.is_empty() && exact_order_match(&self.expected, &self.actual)
    }
}

impl fmt::Display for SequenceDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expected ({}): {:?}", self.expected.len(), self.expected)?;
        write!(f, "Actual   ({}): {:?}", self.actual.len(), self.actual)?;
        let sections = [
            ("Duplicates", &self.duplicates),
            ("Missing", &self.missing),
            ("Unexpected", &self.unexpected),
            ("Out of order", &self.out_of_order),
        ];
        for (title, values) in sections {
            if !values.is_empty() {
                write!(f, "\n{title}: {values:?}")?;
            }
        }
        Ok(())
    }
}

/// Raise [`PomError::Validation`] unless `actual` matches `expected` exactly
pub fn verify_sequence<E: AsRef<str>, A: AsRef<str>>(
    context: &str,
    expected: &[E],
    actual: &[A],
) -> PomResult<()> {
    let diff = SequenceDiff::compute(expected, actual);
    if diff.is_match() {
        info!(context, count = diff.actual.len(), "sequence matches expectation");
        return Ok(());
    }
    error!(context, report = %diff, "sequence mismatch");
    Err(PomError::validation(context, diff.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EMPTY: [&str; 0] = [];

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_duplicates_in_second_occurrence_order() {
            assert_eq!(get_duplicates(&["A", "B", "A", "C", "B"]), vec!["A", "B"]);
            assert_eq!(get_duplicates(&["B", "A", "A", "B", "B"]), vec!["A", "B"]);
            assert!(has_duplicates(&["x", "y", "x"]));
            assert!(!has_duplicates(&["x", "y"]));
        }

        #[test]
        fn test_missing_and_unexpected() {
            assert_eq!(list_missing(&["A", "B", "C"], &["A", "C"]), vec!["B"]);
            assert_eq!(list_unexpected(&["A", "C"], &["A", "B", "C"]), vec!["B"]);
        }

        #[test]
        fn test_out_of_order() {
            assert_eq!(
                list_out_of_order(&["A", "B", "C"], &["B", "A", "C"]),
                vec!["A (expected @0, actual @1)", "B (expected @1, actual @0)"]
            );
        }

        #[test]
        fn test_out_of_order_ignores_absent() {
            assert!(list_out_of_order(&["A", "Z"], &["A"]).is_empty());
        }

        #[test]
        fn test_out_of_order_duplicate_expected_uses_first_occurrence() {
            assert_eq!(
                list_out_of_order(&["A", "A"], &["A", "A"]),
                vec!["A (expected @1, actual @0)"]
            );
        }

        #[test]
        fn test_trim_all() {
            assert_eq!(trim_all(&[None, Some(" x "), Some("")]), vec!["", "x", ""]);
        }

        #[test]
        fn test_empty_inputs() {
            assert!(exact_order_match(&EMPTY, &EMPTY));
            assert!(!exact_order_match(&["A"], &EMPTY));
            assert!(get_duplicates(&EMPTY).is_empty());
            assert!(list_missing(&EMPTY, &["A"]).is_empty());
            assert_eq!(list_unexpected(&EMPTY, &["A"]), vec!["A"]);
            assert!(list_out_of_order(&EMPTY, &EMPTY).is_empty());
            assert!(trim_all::<&str>(&[]).is_empty());
        }

        #[test]
        fn test_case_sensitive() {
            assert!(!exact_order_match(&["GST"], &["gst"]));
            assert_eq!(list_missing(&["GST"], &["gst"]), vec!["GST"]);
        }
    }

    mod sequence_diff_tests {
        use super::*;

        #[test]
        fn test_match_after_trimming() {
            let diff = SequenceDiff::compute(&["Compliance", "GST"], &[" Compliance ", "GST\n"]);
            assert!(diff.is_match());
            let actual = [" Compliance ", "GST\n"];
            assert!(verify_sequence("topics", &["Compliance", "GST"], &actual).is_ok());
        }

        #[test]
        fn test_duplicate_breaks_match() {
            let diff = SequenceDiff::compute(&["A", "B", "A"], &["A", "B", "A"]);
            assert!(!diff.is_match());
            assert_eq!(diff.duplicates, vec!["A"]);
        }

        #[test]
        fn test_report_lists_only_non_empty_sections() {
            let diff = SequenceDiff::compute(&["A", "B", "C"], &["B", "A", "D"]);
            let report = diff.to_string();
            assert!(report.contains("Missing: [\"C\"]"));
            assert!(report.contains("Unexpected: [\"D\"]"));
            assert!(report.contains(
                "Out of order: [\"A (expected @0, actual @1)\", \"B (expected @1, actual @0)\"]"
            ));
            assert!(!report.contains("Duplicates"));
        }

        #[test]
        fn test_verify_sequence_raises_validation() {
            let err = verify_sequence("FAQ topics", &["A"], &["B"]).unwrap_err();
            match err {
                PomError::Validation { context, message } => {
                    assert_eq!(context, "FAQ topics");
                    assert!(message.contains("Missing: [\"A\"]"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_serializes_for_reports() {
            let diff = SequenceDiff::compute(&["A"], &["A"]);
            let json = serde_json::to_value(&diff).unwrap();
            assert_eq!(json["expected"], serde_json::json!(["A"]));
        }
    }

    fn labels() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[A-E]{1,2}", 0..8)
    }

    proptest! {
        #[test]
        fn prop_exact_order_match_is_elementwise_equality(e in labels(), a in labels()) {
            let manual = e.len() == a.len() && (0..e.len()).all(|i| e[i] == a[i]);
            prop_assert_eq!(exact_order_match(&e, &a), manual);
        }

        #[test]
        fn prop_sequence_matches_itself(e in labels()) {
            prop_assert!(exact_order_match(&e, &e));
            prop_assert!(list_missing(&e, &e).is_empty());
            prop_assert!(list_unexpected(&e, &e).is_empty());
        }

        #[test]
        fn prop_duplicates_reported_once(items in labels()) {
            let dups = get_duplicates(&items);
            prop_assert!(!has_duplicates(&dups));
            prop_assert_eq!(dups.is_empty(), !has_duplicates(&items));
            for d in &dups {
                prop_assert!(items.iter().filter(|i| *i == d).count() >= 2);
            }
        }

        #[test]
        fn prop_missing_absent_from_actual(e in labels(), a in labels()) {
            for m in list_missing(&e, &a) {
                prop_assert!(!a.contains(&m));
                prop_assert!(e.contains(&m));
            }
        }

        #[test]
        fn prop_unexpected_is_missing_mirrored(e in labels(), a in labels()) {
            prop_assert_eq!(list_unexpected(&e, &a), list_missing(&a, &e));
        }

        #[test]
        fn prop_exact_match_without_duplicates_has_no_out_of_order(e in labels()) {
            let unique: Vec<String> = e.iter().enumerate()
                .filter(|(i, v)| !e[..*i].contains(*v))
                .map(|(_, v)| v.clone())
                .collect();
            prop_assert!(list_out_of_order(&unique, &unique).is_empty());
        }

        #[test]
        fn prop_trim_all_preserves_length(
            items in prop::collection::vec(prop::option::of(" ?[a-z]{0,3} ?"), 0..8)
        ) {
            let trimmed = trim_all(&items);
            prop_assert_eq!(trimmed.len(), items.len());
            for t in &trimmed {
                prop_assert_eq!(t.trim(), t.as_str());
            }
        }
    }
}
