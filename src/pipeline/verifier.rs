//! Read-only cross-check of a snapshot against the authoritative spreadsheet

use crate::input::AuthoritativeOverlay;
use crate::snapshot::Snapshot;
use crate::types::{
    LocaleCode,
    SectionId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The overlay value equals the snapshot value after trimming.
    Correct,
    Mismatch { expected: String, actual: String },
    /// The spreadsheet cell is empty, whatever the snapshot holds.
    MissingInSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSection {
    pub section: SectionId,
    pub classification: Classification,
}

/// One entry per section, 1 through 114.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub locale: LocaleCode,
    pub sections: Vec<VerifiedSection>,
}

impl VerificationReport {
    #[must_use]
    pub fn correct(&self) -> usize {
        self.count(|c| matches!(c, Classification::Correct))
    }

    #[must_use]
    pub fn mismatched(&self) -> usize {
        self.count(|c| matches!(c, Classification::Mismatch { .. }))
    }

    #[must_use]
    pub fn missing_in_source(&self) -> usize {
        self.count(|c| matches!(c, Classification::MissingInSource))
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &VerifiedSection> {
        self.sections.iter().filter(|s| matches!(s.classification, Classification::Mismatch { .. }))
    }

    fn count(&self, predicate: impl Fn(&Classification) -> bool) -> usize {
        self.sections.iter().filter(|s| predicate(&s.classification)).count()
    }
}

/// Classifies every section of `locale` in `snapshot` against `overlay`.
#[must_use]
pub fn verify(
    snapshot: &Snapshot,
    overlay: &AuthoritativeOverlay,
    locale: &LocaleCode,
) -> VerificationReport {
    let sections: Vec<VerifiedSection> = SectionId::all()
        .map(|section| {
            let expected = overlay.get(section).map_or("", str::trim);
            let actual = snapshot.value(section, locale);
            let classification = if expected.is_empty() {
                Classification::MissingInSource
            } else if expected == actual {
                Classification::Correct
            } else {
                Classification::Mismatch { expected: expected.to_string(), actual: actual.to_string() }
            };
            VerifiedSection { section, classification }
        })
        .collect();

    let report = VerificationReport { locale: locale.clone(), sections };
    tracing::info!(
        locale = %locale,
        correct = report.correct(),
        mismatched = report.mismatched(),
        missing_in_source = report.missing_in_source(),
        "Verified snapshot"
    );
    report
}
