//! Quran.com v4 HTTP client

use std::time::Duration;

use super::{
    ChapterSource,
    VerseMarkupSource,
};
use crate::config::PipelineSettings;
use crate::error::PipelineError;
use crate::input::ChapterDto;
use crate::input::chapters::parse_chapters;
use crate::input::verses::parse_verse_markup;
use crate::types::LocaleCode;

/// Public, unauthenticated endpoints of the Quran.com v4 API.
#[derive(Debug, Clone)]
pub struct QuranApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl QuranApiClient {
    /// # Errors
    /// `Transport` when the HTTP client cannot be built.
    pub fn new(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client, base_url: settings.api_base_url.trim_end_matches('/').to_string() })
    }

    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> Result<String, PipelineError> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(url = %url, ?query, "GET");

        let response = self.client.get(&url).query(query).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl ChapterSource for QuranApiClient {
    async fn chapters(&self, locale: &LocaleCode) -> Result<Vec<ChapterDto>, PipelineError> {
        let body = self.get_text("chapters", &[("language", locale.as_str())]).await?;
        parse_chapters(&body)
    }
}

impl VerseMarkupSource for QuranApiClient {
    async fn verse_markup(&self, verse_key: &str) -> Result<Option<String>, PipelineError> {
        let body =
            self.get_text("quran/verses/uthmani_tajweed", &[("verse_key", verse_key)]).await?;
        parse_verse_markup(&body)
    }
}
