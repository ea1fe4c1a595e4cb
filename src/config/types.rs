use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::types::LocaleCode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "locales[0].code")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineSettings {
    /// Base URL of the Quran.com v4 API.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,

    /// Locales written to every Snapshot record, in fetch order.
    pub locales: Vec<LocaleSettings>,

    /// The always-present locale used as fallback content.
    pub default_locale: LocaleCode,

    /// Relative paths are resolved against the workspace root.
    pub snapshot_path: PathBuf,

    pub overlay: OverlayConfig,
    pub markup: MarkupConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleSettings {
    pub code: LocaleCode,
    /// Language name the API reports in `translated_name.language_name`.
    pub language_name: String,
}

impl LocaleSettings {
    fn new(code: &str, language_name: &str) -> Self {
        Self { code: LocaleCode::from(code), language_name: language_name.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    pub spreadsheet_path: PathBuf,
    /// 1-based column holding the override text.
    pub column: usize,
    pub header_rows: usize,
    /// Snapshot locale field corrected by the spreadsheet.
    pub locale: LocaleCode,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            spreadsheet_path: PathBuf::from("assets/quran/Surah_name_Japanses.xlsx"),
            column: 2,
            header_rows: 1,
            locale: LocaleCode::from("ja"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkupConfig {
    /// Directory holding `s001.json` .. `s114.json`.
    pub verses_dir: PathBuf,
    /// Verse field receiving the markup text.
    pub field: String,
    /// Attempts per verse before it is counted as failed.
    pub max_attempts: u32,
    pub rate_limit: RateLimitConfig,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            verses_dir: PathBuf::from("assets/quran"),
            field: "tj".to_string(),
            max_attempts: 3,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RateLimitConfig {
    FixedInterval { interval_ms: u64 },
    TokenBucket { capacity: u32, refill_interval_ms: u64 },
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::FixedInterval { interval_ms: 100 }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.quran.com/api/v4".to_string(),
            request_timeout_secs: 20,
            user_agent: concat!("surah-meanings/", env!("CARGO_PKG_VERSION")).to_string(),
            locales: vec![
                LocaleSettings::new("en", "english"),
                LocaleSettings::new("id", "indonesian"),
                LocaleSettings::new("zh", "chinese"),
                LocaleSettings::new("ja", "japanese"),
            ],
            default_locale: LocaleCode::from("en"),
            snapshot_path: PathBuf::from("assets/quran/surah_meanings.json"),
            overlay: OverlayConfig::default(),
            markup: MarkupConfig::default(),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn locale_codes(&self) -> Vec<LocaleCode> {
        self.locales.iter().map(|l| l.code.clone()).collect()
    }

    /// Configured locales with the default locale moved to the front.
    #[must_use]
    pub fn fetch_order(&self) -> Vec<&LocaleSettings> {
        let (default, rest): (Vec<_>, Vec<_>) =
            self.locales.iter().partition(|l| l.code == self.default_locale);
        default.into_iter().chain(rest).collect()
    }

    #[must_use]
    pub fn language_name(&self, code: &LocaleCode) -> Option<&str> {
        self.locales.iter().find(|l| &l.code == code).map(|l| l.language_name.as_str())
    }

    /// # Errors
    /// - Required field is empty
    /// - Duplicate locale code
    /// - Default or overlay locale not configured
    /// - Invalid spreadsheet column or rate limit
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.api_base_url.trim().is_empty() {
            errors.push(ValidationError::new(
                "apiBaseUrl",
                "The URL cannot be empty. Example: \"https://api.quran.com/api/v4\"",
            ));
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::new("requestTimeoutSecs", "The timeout must be at least 1"));
        }

        if self.locales.is_empty() {
            errors.push(ValidationError::new(
                "locales",
                "At least one locale is required. Example: [{\"code\": \"en\", \"languageName\": \"english\"}]",
            ));
        }

        for (index, locale) in self.locales.iter().enumerate() {
            if locale.code.as_str().trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("locales[{index}].code"),
                    "The locale code cannot be empty",
                ));
            }
            if self.locales.iter().take(index).any(|other| other.code == locale.code) {
                errors.push(ValidationError::new(
                    format!("locales[{index}].code"),
                    format!("Duplicate locale code '{}'", locale.code),
                ));
            }
        }

        let codes = self.locale_codes();
        if !codes.contains(&self.default_locale) {
            errors.push(ValidationError::new(
                "defaultLocale",
                format!("'{}' must be one of the configured locales", self.default_locale),
            ));
        }
        if !codes.contains(&self.overlay.locale) {
            errors.push(ValidationError::new(
                "overlay.locale",
                format!("'{}' must be one of the configured locales", self.overlay.locale),
            ));
        }

        if self.overlay.column == 0 {
            errors.push(ValidationError::new(
                "overlay.column",
                "Columns are 1-based. Use 2 for column B",
            ));
        }

        if self.markup.field.is_empty() {
            errors.push(ValidationError::new("markup.field", "The field name cannot be empty"));
        }
        if self.markup.max_attempts == 0 {
            errors.push(ValidationError::new("markup.maxAttempts", "At least one attempt is required"));
        }
        if let RateLimitConfig::TokenBucket { capacity: 0, .. } = self.markup.rate_limit {
            errors.push(ValidationError::new(
                "markup.rateLimit.capacity",
                "The bucket capacity must be at least 1",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
