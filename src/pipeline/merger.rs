//! Per-locale fetch results → one canonical [`Snapshot`]

use std::collections::HashMap;

use crate::error::PipelineError;
use crate::input::RawLocaleFetchResult;
use crate::snapshot::{
    LocalizedMeaning,
    Snapshot,
};
use crate::types::{
    LocaleCode,
    SectionId,
};

/// Builds the snapshot from one result per configured locale.
///
/// Every section gets every locale in `locales`; a missing entry becomes `""`.
///
/// # Errors
/// - `MissingLocale` when a configured locale has no result
/// - `IncompleteDataset` listing every section whose `default` value is empty
pub fn merge(
    results: &[RawLocaleFetchResult],
    locales: &[LocaleCode],
    default: &LocaleCode,
) -> Result<Snapshot, PipelineError> {
    let by_locale: HashMap<&LocaleCode, &RawLocaleFetchResult> =
        results.iter().map(|r| (r.locale(), r)).collect();

    let mut selected = Vec::with_capacity(locales.len());
    for locale in locales {
        let Some(result) = by_locale.get(locale) else {
            return Err(PipelineError::MissingLocale(locale.clone()));
        };
        selected.push((locale, *result));
    }
    if !locales.contains(default) {
        return Err(PipelineError::MissingLocale(default.clone()));
    }

    let mut snapshot = Snapshot::new();
    let mut incomplete = Vec::new();
    for section in SectionId::all() {
        let meaning: LocalizedMeaning = selected
            .iter()
            .map(|(locale, result)| {
                ((*locale).clone(), result.meaning(section).unwrap_or_default().trim().to_string())
            })
            .collect();
        if meaning.normalized(default).is_empty() {
            incomplete.push(section);
        }
        snapshot.insert(section, meaning);
    }

    if !incomplete.is_empty() {
        tracing::warn!(count = incomplete.len(), "Default-locale meanings are missing");
        return Err(PipelineError::IncompleteDataset { sections: incomplete });
    }

    tracing::debug!(sections = snapshot.len(), locales = locales.len(), "Merged snapshot");
    Ok(snapshot)
}
