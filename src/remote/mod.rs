//! Remote sources and the policies governing how often they are called.
mod client;
mod rate_limit;

use std::future::Future;

pub use client::QuranApiClient;
pub use rate_limit::{
    ConfiguredRateLimit,
    FixedInterval,
    RateLimit,
    TokenBucket,
};

use crate::error::PipelineError;
use crate::input::ChapterDto;
use crate::types::LocaleCode;

/// Source of per-locale chapter metadata.
pub trait ChapterSource {
    /// Fetches every chapter for `locale` in one request.
    fn chapters(
        &self,
        locale: &LocaleCode,
    ) -> impl Future<Output = Result<Vec<ChapterDto>, PipelineError>> + Send;
}

/// Source of per-verse markup text.
pub trait VerseMarkupSource {
    /// Markup for `verse_key` (`"<section>:<verse>"`), `None` when the source has no verse.
    fn verse_markup(
        &self,
        verse_key: &str,
    ) -> impl Future<Output = Result<Option<String>, PipelineError>> + Send;
}
