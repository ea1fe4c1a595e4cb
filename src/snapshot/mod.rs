//! The persisted canonical dataset
//!
//! ```json
//! {
//!   "1": { "en": "The Opener", "id": "Pembukaan", "zh": "开端", "ja": "開端" },
//!   "2": { ... }
//! }
//! ```
//!
//! Keys are written in ascending numeric order, locale fields in configured
//! order, and non-ASCII text is not escaped.

mod persist;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{
    MapAccess,
    Visitor,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

pub use persist::write_atomic;

use crate::error::PipelineError;
use crate::types::{
    LocaleCode,
    SECTION_COUNT,
    SectionId,
};

/// Per-locale meanings of one surah.
///
/// Fields keep the order they were inserted or read in, so a snapshot written
/// in configured locale order stays in that order across load and save.
#[derive(Debug, Clone, Default)]
pub struct LocalizedMeaning(Vec<(LocaleCode, String)>);

impl LocalizedMeaning {
    /// Value for `locale`, or `""` when the field is absent.
    #[must_use]
    pub fn get(&self, locale: &LocaleCode) -> &str {
        self.0.iter().find(|(l, _)| l == locale).map_or("", |(_, v)| v.as_str())
    }

    /// Trimmed value for `locale`.
    #[must_use]
    pub fn normalized(&self, locale: &LocaleCode) -> &str {
        self.get(locale).trim()
    }

    /// Replaces the value in place, or appends the field when it is new.
    pub fn set(&mut self, locale: LocaleCode, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(l, _)| *l == locale) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((locale, value)),
        }
    }

    /// Locale codes in field order.
    pub fn locales(&self) -> impl Iterator<Item = &LocaleCode> {
        self.0.iter().map(|(l, _)| l)
    }

    #[must_use]
    pub fn has_locale(&self, locale: &LocaleCode) -> bool {
        self.0.iter().any(|(l, _)| l == locale)
    }
}

/// 順序は比較しない
impl PartialEq for LocalizedMeaning {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|(l, v)| other.has_locale(l) && other.get(l) == v)
    }
}

impl Eq for LocalizedMeaning {}

impl<L: Into<LocaleCode>, V: Into<String>> FromIterator<(L, V)> for LocalizedMeaning {
    fn from_iter<T: IntoIterator<Item = (L, V)>>(iter: T) -> Self {
        let mut meaning = Self::default();
        for (l, v) in iter {
            meaning.set(l.into(), v);
        }
        meaning
    }
}

impl Serialize for LocalizedMeaning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(l, v)| (l, v)))
    }
}

impl<'de> Deserialize<'de> for LocalizedMeaning {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LocalizedMeaningVisitor)
    }
}

/// Reads a JSON object field by field, keeping the file's order.
struct LocalizedMeaningVisitor;

impl<'de> Visitor<'de> for LocalizedMeaningVisitor {
    type Value = LocalizedMeaning;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object of locale code to meaning")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut meaning = LocalizedMeaning(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((locale, value)) = access.next_entry::<LocaleCode, String>()? {
            meaning.set(locale, value);
        }
        Ok(meaning)
    }
}

/// Surah number to localized meanings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<SectionId, LocalizedMeaning>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, section: SectionId, meaning: LocalizedMeaning) {
        self.records.insert(section, meaning);
    }

    #[must_use]
    pub fn get(&self, section: SectionId) -> Option<&LocalizedMeaning> {
        self.records.get(&section)
    }

    pub fn get_mut(&mut self, section: SectionId) -> Option<&mut LocalizedMeaning> {
        self.records.get_mut(&section)
    }

    pub fn remove(&mut self, section: SectionId) -> Option<LocalizedMeaning> {
        self.records.remove(&section)
    }

    /// Records in ascending section order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &LocalizedMeaning)> {
        self.records.iter().map(|(id, meaning)| (*id, meaning))
    }

    pub fn sections(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.records.keys().copied()
    }

    #[must_use]
    pub fn contains(&self, section: SectionId) -> bool {
        self.records.contains_key(&section)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trimmed value of `locale` for `section`, `""` when either is absent.
    #[must_use]
    pub fn value(&self, section: SectionId, locale: &LocaleCode) -> &str {
        self.get(section).map_or("", |m| m.normalized(locale))
    }

    /// Number of sections with a non-empty value for `locale`.
    #[must_use]
    pub fn coverage(&self, locale: &LocaleCode) -> usize {
        self.records.values().filter(|m| !m.normalized(locale).is_empty()).count()
    }

    /// Checks the canonical-shape invariants.
    ///
    /// # Errors
    /// - `Schema` when a section is missing or a record has a different locale set
    /// - `IncompleteDataset` when the default locale is empty somewhere
    pub fn validate(&self, locales: &[LocaleCode], default: &LocaleCode) -> Result<(), PipelineError> {
        let missing: Vec<String> =
            SectionId::all().filter(|id| !self.contains(*id)).map(|id| id.to_string()).collect();
        if !missing.is_empty() {
            return Err(PipelineError::Schema(format!(
                "snapshot must hold all {SECTION_COUNT} sections; missing: {}",
                missing.join(", ")
            )));
        }

        for (section, meaning) in self.iter() {
            let mut expected: Vec<&LocaleCode> = locales.iter().collect();
            expected.sort();
            let mut actual: Vec<&LocaleCode> = meaning.locales().collect();
            actual.sort();
            if actual != expected {
                return Err(PipelineError::Schema(format!(
                    "section {section} has locales [{}], expected [{}]",
                    join_locales(&actual),
                    join_locales(&expected)
                )));
            }
        }

        let empty: Vec<SectionId> =
            self.iter().filter(|(_, m)| m.normalized(default).is_empty()).map(|(id, _)| id).collect();
        if !empty.is_empty() {
            return Err(PipelineError::IncompleteDataset { sections: empty });
        }
        Ok(())
    }

    /// Reads a snapshot without checking its invariants.
    ///
    /// # Errors
    /// - I/O errors
    /// - `Schema` when the file is not a snapshot object
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        tracing::debug!(path = %path.display(), "Reading snapshot");
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PipelineError::Schema(format!("{}: {e}", path.display())))
    }

    /// Pretty JSON with two-space indentation and a trailing newline.
    ///
    /// # Errors
    /// Serialization errors.
    pub fn to_json_string(&self) -> Result<String, PipelineError> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }

    /// Replaces the file at `path` with this snapshot.
    ///
    /// # Errors
    /// Serialization or I/O errors. The previous file is left intact on failure.
    pub fn save_atomic(&self, path: &Path) -> Result<(), PipelineError> {
        let content = self.to_json_string()?;
        write_atomic(path, content.as_bytes())?;
        tracing::info!(path = %path.display(), sections = self.len(), "Wrote snapshot");
        Ok(())
    }
}

/// `en, ja` style list for error messages.
fn join_locales(locales: &[&LocaleCode]) -> String {
    locales.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ")
}
