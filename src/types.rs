//! Core types used throughout the project.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Number of surahs in the Quran.
pub const SECTION_COUNT: u16 = 114;

/// A surah number, always within `1..=114`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SectionId(u16);

impl SectionId {
    /// Returns `None` when `value` is outside `1..=114`.
    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value >= 1 && value <= SECTION_COUNT { Some(Self(value)) } else { None }
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Iterates every section in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=SECTION_COUNT).map(Self)
    }

    /// Maps a 0-based data row of the authoritative spreadsheet to its section.
    #[must_use]
    pub fn from_row_index(index: usize) -> Option<Self> {
        u16::try_from(index).ok().and_then(|i| i.checked_add(1)).and_then(Self::new)
    }
}

impl TryFrom<u16> for SectionId {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("section id {value} is outside 1..={SECTION_COUNT}"))
    }
}

impl From<SectionId> for u16 {
    fn from(id: SectionId) -> Self {
        id.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A locale code such as `en` or `ja`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleCode(String);

impl LocaleCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw language tag.
    #[must_use]
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.0.eq_ignore_ascii_case(tag.trim())
    }
}

impl From<&str> for LocaleCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
