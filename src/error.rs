//! Error taxonomy shared by every pipeline stage.

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::{
    LocaleCode,
    SectionId,
};

/// Defines errors that abort a pipeline stage before anything is persisted
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Network, timeout or HTTP status failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Response or file does not have the expected shape
    #[error("Unexpected data shape: {0}")]
    Schema(String),

    /// The remote source returned the wrong number of chapters
    #[error("Expected {expected} chapters for locale '{locale}', got {actual}")]
    CountMismatch { locale: LocaleCode, expected: usize, actual: usize },

    /// Some sections have no default-locale meaning after merge
    #[error("Missing default-locale meaning for sections: {}", format_sections(.sections))]
    IncompleteDataset { sections: Vec<SectionId> },

    /// No fetch result was supplied for a configured locale
    #[error("No fetch result for locale '{0}'")]
    MissingLocale(LocaleCode),

    /// The authoritative spreadsheet could not be read
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Whether a per-record job may retry the failed operation.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Schema(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Comma-separated section numbers.
fn format_sections(sections: &[SectionId]) -> String {
    sections.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
