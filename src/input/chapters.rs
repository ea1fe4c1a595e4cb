//! Chapter metadata returned by the remote source

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::PipelineError;
use crate::types::{
    LocaleCode,
    SECTION_COUNT,
    SectionId,
};

/// Body of `GET /chapters?language=<code>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChaptersResponse {
    pub chapters: Vec<ChapterDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterDto {
    pub id: u16,
    pub translated_name: TranslatedNameDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslatedNameDto {
    /// Language the source claims the name is written in (e.g. `english`).
    #[serde(default)]
    pub language_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Parses a chapters response body.
///
/// # Errors
/// `PipelineError::Schema` when the body is not a chapters object.
pub fn parse_chapters(body: &str) -> Result<Vec<ChapterDto>, PipelineError> {
    serde_json::from_str::<ChaptersResponse>(body)
        .map(|response| response.chapters)
        .map_err(|e| PipelineError::Schema(format!("invalid chapters response: {e}")))
}

/// One section's meaning as delivered by the remote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub section: SectionId,
    /// Trimmed display name.
    pub meaning: String,
    pub declared_language: String,
}

/// All 114 meanings fetched for one locale, in response order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocaleFetchResult {
    locale: LocaleCode,
    entries: Vec<RawEntry>,
}

impl RawLocaleFetchResult {
    /// Builds a result from a chapters response.
    ///
    /// # Errors
    /// - `CountMismatch` unless exactly 114 chapters were returned
    /// - `Schema` for out-of-range or duplicate chapter ids
    pub fn from_chapters(
        locale: LocaleCode,
        chapters: Vec<ChapterDto>,
    ) -> Result<Self, PipelineError> {
        let expected = usize::from(SECTION_COUNT);
        if chapters.len() != expected {
            return Err(PipelineError::CountMismatch { locale, expected, actual: chapters.len() });
        }

        let mut seen = HashSet::with_capacity(expected);
        let mut entries = Vec::with_capacity(expected);
        for chapter in chapters {
            let section = SectionId::new(chapter.id).ok_or_else(|| {
                PipelineError::Schema(format!(
                    "chapter id {} for locale '{locale}' is outside 1..={SECTION_COUNT}",
                    chapter.id
                ))
            })?;
            if !seen.insert(section) {
                return Err(PipelineError::Schema(format!(
                    "chapter id {section} returned twice for locale '{locale}'"
                )));
            }
            entries.push(RawEntry {
                section,
                meaning: chapter.translated_name.name.unwrap_or_default().trim().to_string(),
                declared_language: chapter.translated_name.language_name,
            });
        }

        Ok(Self { locale, entries })
    }

    #[must_use]
    pub const fn locale(&self) -> &LocaleCode {
        &self.locale
    }

    #[must_use]
    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    /// Language tag the response declares, taken from its first chapter.
    #[must_use]
    pub fn declared_language(&self) -> Option<&str> {
        self.entries.first().map(|e| e.declared_language.as_str())
    }

    #[must_use]
    pub fn non_empty_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.meaning.is_empty()).count()
    }

    #[must_use]
    pub fn meaning(&self, section: SectionId) -> Option<&str> {
        self.entries.iter().find(|e| e.section == section).map(|e| e.meaning.as_str())
    }

    /// Copies these entries under another locale.
    #[must_use]
    pub fn relabelled(&self, locale: LocaleCode) -> Self {
        Self { locale, entries: self.entries.clone() }
    }
}
