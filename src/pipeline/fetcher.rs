//! Locale fetcher
//!
//! One request per locale, awaited one after another so the remote source
//! never sees concurrent calls from this tool.

use super::fallback::{
    FallbackDetected,
    FallbackPolicy,
    correct_fallback,
};
use crate::config::PipelineSettings;
use crate::error::PipelineError;
use crate::input::RawLocaleFetchResult;
use crate::remote::ChapterSource;
use crate::types::LocaleCode;

/// Fetches the meanings of one locale.
///
/// # Errors
/// - `Transport` on network failure
/// - `Schema` on a malformed response
/// - `CountMismatch` unless exactly 114 chapters were returned
pub async fn fetch_locale<S>(
    source: &S,
    locale: &LocaleCode,
) -> Result<RawLocaleFetchResult, PipelineError>
where
    S: ChapterSource + ?Sized,
{
    tracing::info!(locale = %locale, "Fetching chapters");

    let chapters = source.chapters(locale).await?;
    let result = RawLocaleFetchResult::from_chapters(locale.clone(), chapters)?;

    tracing::info!(
        locale = %locale,
        chapters = result.entries().len(),
        non_empty = result.non_empty_count(),
        "Fetched chapters"
    );
    Ok(result)
}

/// Per-locale results of one fetch run, fallback already corrected.
#[derive(Debug, Clone, Default)]
pub struct FetchRun {
    pub results: Vec<RawLocaleFetchResult>,
    pub fallbacks: Vec<FallbackDetected>,
}

/// Fetches every configured locale serially, the default locale first.
///
/// # Errors
/// The first error of any locale aborts the run.
pub async fn fetch_all<S, P>(
    source: &S,
    settings: &PipelineSettings,
    policy: &P,
) -> Result<FetchRun, PipelineError>
where
    S: ChapterSource + ?Sized,
    P: FallbackPolicy + ?Sized,
{
    let mut run = FetchRun::default();
    let mut default_result: Option<RawLocaleFetchResult> = None;

    for locale in settings.fetch_order() {
        let result = fetch_locale(source, &locale.code).await?;

        if locale.code == settings.default_locale {
            default_result = Some(result.clone());
            run.results.push(result);
            continue;
        }

        let Some(default) = default_result.as_ref() else {
            return Err(PipelineError::MissingLocale(settings.default_locale.clone()));
        };
        let outcome = correct_fallback(result, default, locale, policy)?;
        if let Some(warning) = outcome.warning() {
            run.fallbacks.push(warning.clone());
        }
        run.results.push(outcome.into_result());
    }

    Ok(run)
}
