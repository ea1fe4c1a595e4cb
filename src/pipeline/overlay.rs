//! Application of authoritative spreadsheet corrections to a snapshot

use std::path::Path;

use crate::error::PipelineError;
use crate::input::AuthoritativeOverlay;
use crate::snapshot::Snapshot;
use crate::types::{
    LocaleCode,
    SectionId,
};

/// One field overwritten by the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayUpdate {
    pub section: SectionId,
    pub previous: String,
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayOutcome {
    pub snapshot: Snapshot,
    /// In ascending section order.
    pub updates: Vec<OverlayUpdate>,
}

/// Overwrites `locale` wherever the overlay holds a different non-empty value.
///
/// Only existing fields are rewritten. Overlay rows for sections absent from
/// `snapshot`, or for records without a `locale` field, are ignored.
#[must_use]
pub fn apply_overlay(
    snapshot: &Snapshot,
    overlay: &AuthoritativeOverlay,
    locale: &LocaleCode,
) -> OverlayOutcome {
    let mut updated = snapshot.clone();
    let mut updates = Vec::new();

    for section in snapshot.sections() {
        let Some(current) = overlay.get(section).map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(meaning) = updated.get_mut(section) else {
            continue;
        };
        if !meaning.has_locale(locale) {
            tracing::warn!(section = %section, locale = %locale, "Record has no such locale field; overlay row ignored");
            continue;
        }
        let previous = meaning.normalized(locale).to_string();
        if previous == current {
            continue;
        }

        tracing::debug!(section = %section, previous = %previous, current = %current, "Overlay update");
        meaning.set(locale.clone(), current);
        updates.push(OverlayUpdate { section, previous, current: current.to_string() });
    }

    tracing::info!(locale = %locale, updates = updates.len(), "Applied authoritative overlay");
    OverlayOutcome { snapshot: updated, updates }
}

/// Writes the updated snapshot only when at least one field changed.
///
/// Returns whether the file was written.
///
/// # Errors
/// Serialization or I/O errors from the atomic write.
pub fn persist_overlay(outcome: &OverlayOutcome, path: &Path) -> Result<bool, PipelineError> {
    if outcome.updates.is_empty() {
        tracing::info!(path = %path.display(), "No overlay updates; snapshot left untouched");
        return Ok(false);
    }
    outcome.snapshot.save_atomic(path)?;
    Ok(true)
}
