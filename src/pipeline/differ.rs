//! Field-level comparison of two snapshots

use std::collections::BTreeSet;

use crate::snapshot::Snapshot;
use crate::types::{
    LocaleCode,
    SectionId,
};

/// One locale value that differs between the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDifference {
    pub section: SectionId,
    pub locale: LocaleCode,
    pub in_a: String,
    pub in_b: String,
}

/// Non-empty value counts of the designated locale on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    pub locale: LocaleCode,
    pub in_a: usize,
    pub in_b: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub only_in_a: Vec<SectionId>,
    pub only_in_b: Vec<SectionId>,
    /// Ascending by section, then by locale.
    pub differences: Vec<FieldDifference>,
    pub coverage: Coverage,
    /// Sections whose designated-locale value is non-empty and equal on both sides.
    pub identical: usize,
}

impl SnapshotDiff {
    /// No section or field differs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.differences.is_empty()
    }
}

/// Compares `a` and `b`. Absent fields count as `""`; values are compared trimmed.
#[must_use]
pub fn diff(a: &Snapshot, b: &Snapshot, coverage_locale: &LocaleCode) -> SnapshotDiff {
    let only_in_a: Vec<SectionId> = a.sections().filter(|id| !b.contains(*id)).collect();
    let only_in_b: Vec<SectionId> = b.sections().filter(|id| !a.contains(*id)).collect();

    let mut differences = Vec::new();
    let mut identical = 0;
    for (section, left) in a.iter() {
        let Some(right) = b.get(section) else {
            continue;
        };

        let locales: BTreeSet<&LocaleCode> = left.locales().chain(right.locales()).collect();
        for locale in locales {
            let in_a = left.normalized(locale);
            let in_b = right.normalized(locale);
            if in_a != in_b {
                differences.push(FieldDifference {
                    section,
                    locale: locale.clone(),
                    in_a: in_a.to_string(),
                    in_b: in_b.to_string(),
                });
            }
        }

        let value = left.normalized(coverage_locale);
        if !value.is_empty() && value == right.normalized(coverage_locale) {
            identical += 1;
        }
    }

    let coverage = Coverage {
        locale: coverage_locale.clone(),
        in_a: a.coverage(coverage_locale),
        in_b: b.coverage(coverage_locale),
    };

    tracing::debug!(
        only_in_a = ?only_in_a,
        only_in_b = ?only_in_b,
        differences = differences.len(),
        "Compared snapshots"
    );
    SnapshotDiff { only_in_a, only_in_b, differences, coverage, identical }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::test_utils::full_snapshot;

    fn id(value: u16) -> SectionId {
        SectionId::new(value).unwrap()
    }

    #[googletest::test]
    fn test_diff_of_identical_snapshots_is_empty() {
        let snapshot = full_snapshot(&["en", "id", "zh", "ja"]);

        let result = diff(&snapshot, &snapshot.clone(), &LocaleCode::from("ja"));

        expect_that!(result.is_empty(), eq(true));
        expect_that!(result.identical, eq(114));
        expect_that!(result.coverage.in_a, eq(114));
        expect_that!(result.coverage.in_b, eq(114));
    }

    #[googletest::test]
    fn test_single_field_change_reports_one_difference() {
        let a = full_snapshot(&["en", "id", "zh", "ja"]);
        let mut b = a.clone();
        b.get_mut(id(5)).unwrap().set(LocaleCode::from("ja"), "変更");

        let result = diff(&a, &b, &LocaleCode::from("ja"));

        assert_eq!(
            result.differences,
            vec![FieldDifference {
                section: id(5),
                locale: LocaleCode::from("ja"),
                in_a: "ja 5".to_string(),
                in_b: "変更".to_string(),
            }]
        );
        expect_that!(result.identical, eq(113));
    }

    #[rstest]
    #[case::padded(" ja 7 ", true)]
    #[case::changed("ja seven", false)]
    fn test_values_compared_after_trim(#[case] value: &str, #[case] equal: bool) {
        let a = full_snapshot(&["en", "ja"]);
        let mut b = a.clone();
        b.get_mut(id(7)).unwrap().set(LocaleCode::from("ja"), value);

        let result = diff(&a, &b, &LocaleCode::from("ja"));

        assert_that!(result.differences.is_empty(), eq(equal));
    }

    #[googletest::test]
    fn test_sections_only_on_one_side() {
        let mut a = full_snapshot(&["en"]);
        let mut b = a.clone();
        a.remove(id(2));
        b.remove(id(113));
        b.remove(id(114));

        let result = diff(&a, &b, &LocaleCode::from("en"));

        assert_eq!(result.only_in_a, vec![id(113), id(114)]);
        assert_eq!(result.only_in_b, vec![id(2)]);
        expect_that!(result.differences.is_empty(), eq(true));
        expect_that!(result.coverage.in_a, eq(113));
        expect_that!(result.coverage.in_b, eq(112));
    }

    #[googletest::test]
    fn test_missing_field_counts_as_empty() {
        let a = full_snapshot(&["en", "ja"]);
        let b = full_snapshot(&["en"]);

        let result = diff(&a, &b, &LocaleCode::from("ja"));

        expect_that!(result.differences.len(), eq(114));
        expect_that!(result.differences[0].in_b.as_str(), eq(""));
        expect_that!(result.coverage.in_b, eq(0));
        expect_that!(result.identical, eq(0));
    }

    #[googletest::test]
    fn test_differences_sorted_by_section_then_locale() {
        let a = full_snapshot(&["en", "ja", "zh"]);
        let mut b = a.clone();
        b.get_mut(id(9)).unwrap().set(LocaleCode::from("zh"), "x");
        b.get_mut(id(9)).unwrap().set(LocaleCode::from("en"), "x");
        b.get_mut(id(3)).unwrap().set(LocaleCode::from("ja"), "x");

        let result = diff(&a, &b, &LocaleCode::from("en"));

        let keys: Vec<(u16, &str)> =
            result.differences.iter().map(|d| (d.section.get(), d.locale.as_str())).collect();
        assert_eq!(keys, vec![(3, "ja"), (9, "en"), (9, "zh")]);
    }
}
