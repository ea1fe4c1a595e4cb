//! Per-surah verse files (`s001.json` .. `s114.json`)

use std::path::{
    Path,
    PathBuf,
};

use serde::Deserialize;
use serde_json::{
    Map,
    Value,
};

use crate::error::PipelineError;
use crate::snapshot::write_atomic;
use crate::types::SectionId;

/// Verse file path for `section` inside `dir`.
#[must_use]
pub fn verse_file_path(dir: &Path, section: SectionId) -> PathBuf {
    dir.join(format!("s{:03}.json", section.get()))
}

/// Body of `GET /quran/verses/uthmani_tajweed?verse_key=<s>:<a>`.
#[derive(Debug, Clone, Deserialize)]
struct VerseMarkupResponse {
    #[serde(default)]
    verses: Vec<VerseMarkupDto>,
}

#[derive(Debug, Clone, Deserialize)]
struct VerseMarkupDto {
    text_uthmani_tajweed: Option<String>,
}

/// Extracts the markup text of the first verse in a response body.
///
/// # Errors
/// `PipelineError::Schema` when the body is not a verses object.
pub fn parse_verse_markup(body: &str) -> Result<Option<String>, PipelineError> {
    let response: VerseMarkupResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::Schema(format!("invalid verses response: {e}")))?;
    Ok(response
        .verses
        .into_iter()
        .next()
        .and_then(|v| v.text_uthmani_tajweed)
        .filter(|text| !text.is_empty()))
}

/// A verse object; unknown fields are kept in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct Verse {
    fields: Map<String, Value>,
}

impl Verse {
    /// Section number carried by the verse, if any.
    #[must_use]
    pub fn section(&self) -> Option<u64> {
        self.fields.get("s").and_then(Value::as_u64)
    }

    /// Verse number within its section.
    #[must_use]
    pub fn number(&self) -> Option<u64> {
        self.fields.get("a").and_then(Value::as_u64)
    }

    /// Whether `field` already holds a non-empty string.
    #[must_use]
    pub fn has_text(&self, field: &str) -> bool {
        self.fields.get(field).and_then(Value::as_str).is_some_and(|s| !s.is_empty())
    }

    pub fn set_text(&mut self, field: &str, text: String) {
        self.fields.insert(field.to_string(), Value::String(text));
    }

    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// All verses of one section as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct VerseFile {
    pub verses: Vec<Verse>,
}

impl VerseFile {
    /// # Errors
    /// - I/O errors
    /// - `Schema` when the file is not an array of objects
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| PipelineError::Schema(format!("{}: {e}", path.display())))
    }

    fn parse(content: &str) -> Result<Self, String> {
        let Value::Array(items) = serde_json::from_str::<Value>(content).map_err(|e| e.to_string())? else {
            return Err("expected a JSON array of verses".to_string());
        };
        let verses = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => Ok(Verse { fields }),
                _ => Err(format!("verse at index {index} is not an object")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { verses })
    }

    /// Serializes with two-space indentation and writes through a temporary file.
    ///
    /// # Errors
    /// I/O or serialization errors.
    pub fn save_atomic(&self, path: &Path) -> Result<(), PipelineError> {
        let items: Vec<Value> =
            self.verses.iter().map(|v| Value::Object(v.fields.clone())).collect();
        let mut content = serde_json::to_string_pretty(&items)?;
        content.push('\n');
        write_atomic(path, content.as_bytes())?;
        Ok(())
    }
}
