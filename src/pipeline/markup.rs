//! Resumable per-verse markup patching
//!
//! Walks the per-section verse files and requests markup only for verses that
//! do not carry it yet, so an interrupted run picks up where it stopped.
//! Each request waits on the configured [`RateLimit`] first.

use std::path::PathBuf;

use crate::config::MarkupConfig;
use crate::error::PipelineError;
use crate::input::VerseFile;
use crate::input::verses::verse_file_path;
use crate::remote::{
    RateLimit,
    VerseMarkupSource,
};
use crate::types::SectionId;

#[derive(Debug, Clone)]
pub struct MarkupOptions {
    pub verses_dir: PathBuf,
    pub field: String,
    pub max_attempts: u32,
    /// Fetch and count, but never rewrite a file.
    pub dry_run: bool,
}

impl MarkupOptions {
    /// `verses_dir` is passed in already resolved against the workspace root.
    #[must_use]
    pub fn new(config: &MarkupConfig, verses_dir: PathBuf, dry_run: bool) -> Self {
        Self { verses_dir, field: config.field.clone(), max_attempts: config.max_attempts, dry_run }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupSummary {
    /// Files that gained markup (counted in dry runs as well).
    pub sections_updated: usize,
    pub verses_updated: usize,
    pub verses_failed: usize,
    /// Verses that already had markup or carry no verse number.
    pub verses_skipped: usize,
}

impl MarkupSummary {
    /// Adds the counts of one section.
    fn absorb(&mut self, section: Self) {
        self.sections_updated += section.sections_updated;
        self.verses_updated += section.verses_updated;
        self.verses_failed += section.verses_failed;
        self.verses_skipped += section.verses_skipped;
    }
}

/// Walks verse files and patches in markup from `source`, paced by `rate_limit`.
#[derive(Debug)]
pub struct MarkupJob<'a, S: ?Sized, L> {
    source: &'a S,
    rate_limit: L,
    options: MarkupOptions,
}

impl<'a, S, L> MarkupJob<'a, S, L>
where
    S: VerseMarkupSource + ?Sized,
    L: RateLimit,
{
    pub const fn new(source: &'a S, rate_limit: L, options: MarkupOptions) -> Self {
        Self { source, rate_limit, options }
    }

    /// Patches the files of `sections` one after another.
    ///
    /// A section that cannot be read or written is logged and skipped.
    ///
    /// # Errors
    /// `Io` when the verses directory does not exist.
    pub async fn run(
        &mut self,
        sections: impl IntoIterator<Item = SectionId>,
    ) -> Result<MarkupSummary, PipelineError> {
        if !self.options.verses_dir.is_dir() {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("verses directory not found: {}", self.options.verses_dir.display()),
            )));
        }

        let mut summary = MarkupSummary::default();
        for section in sections {
            match self.update_section(section).await {
                Ok(Some(outcome)) => summary.absorb(outcome),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(section = %section, error = %e, "Failed to update section, continuing");
                }
            }
        }

        tracing::info!(
            sections_updated = summary.sections_updated,
            verses_updated = summary.verses_updated,
            verses_failed = summary.verses_failed,
            verses_skipped = summary.verses_skipped,
            dry_run = self.options.dry_run,
            "Markup job finished"
        );
        Ok(summary)
    }

    /// `None` when the section has no verse file.
    async fn update_section(
        &mut self,
        section: SectionId,
    ) -> Result<Option<MarkupSummary>, PipelineError> {
        let path = verse_file_path(&self.options.verses_dir, section);
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Verse file not found, skipping");
            return Ok(None);
        }

        tracing::info!(section = %section, "Processing section");
        let mut file = VerseFile::load(&path)?;
        let field = self.options.field.clone();
        let mut outcome = MarkupSummary::default();

        for verse in &mut file.verses {
            if verse.has_text(&field) {
                outcome.verses_skipped += 1;
                continue;
            }
            let Some(number) = verse.number().filter(|n| *n > 0) else {
                outcome.verses_skipped += 1;
                continue;
            };

            let verse_section = verse.section().unwrap_or_else(|| u64::from(section.get()));
            let key = format!("{verse_section}:{number}");
            match self.fetch_markup(&key).await {
                Some(text) => {
                    verse.set_text(&field, text);
                    outcome.verses_updated += 1;
                }
                None => outcome.verses_failed += 1,
            }
        }

        if outcome.verses_updated > 0 {
            outcome.sections_updated = 1;
            if self.options.dry_run {
                tracing::info!(path = %path.display(), verses = outcome.verses_updated, "Dry run, not writing");
            } else {
                file.save_atomic(&path)?;
                tracing::info!(path = %path.display(), verses = outcome.verses_updated, "Updated verse file");
            }
        }
        Ok(Some(outcome))
    }

    /// Requests one verse, retrying transport failures up to `max_attempts`.
    async fn fetch_markup(&mut self, verse_key: &str) -> Option<String> {
        let max_attempts = self.options.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            self.rate_limit.acquire().await;
            match self.source.verse_markup(verse_key).await {
                Ok(Some(text)) => return Some(text),
                Ok(None) => {
                    tracing::warn!(verse = verse_key, "No markup returned");
                    return None;
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::debug!(verse = verse_key, attempt, error = %e, "Retrying");
                }
                Err(e) => {
                    tracing::warn!(verse = verse_key, attempt, error = %e, "Failed to fetch markup");
                    return None;
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use googletest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::remote::FixedInterval;

    /// Canned markup per verse key; keys listed in `flaky` fail that many times first.
    #[derive(Default)]
    struct FakeMarkupSource {
        markup: HashMap<String, String>,
        flaky: Mutex<HashMap<String, u32>>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeMarkupSource {
        fn with(keys: &[&str]) -> Self {
            Self {
                markup: keys.iter().map(|k| ((*k).to_string(), format!("<tajweed>{k}</tajweed>"))).collect(),
                ..Self::default()
            }
        }

        fn fail_first(self, key: &str, times: u32) -> Self {
            self.flaky.lock().unwrap().insert(key.to_string(), times);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl VerseMarkupSource for FakeMarkupSource {
        async fn verse_markup(&self, verse_key: &str) -> Result<Option<String>, PipelineError> {
            self.requests.lock().unwrap().push(verse_key.to_string());
            if let Some(remaining) = self.flaky.lock().unwrap().get_mut(verse_key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(PipelineError::Transport("connection reset".to_string()));
                }
            }
            Ok(self.markup.get(verse_key).cloned())
        }
    }

    fn id(value: u16) -> SectionId {
        SectionId::new(value).unwrap()
    }

    fn write_verses(dir: &TempDir, section: u16, verses: &serde_json::Value) -> PathBuf {
        let path = verse_file_path(dir.path(), id(section));
        std::fs::write(&path, serde_json::to_string_pretty(verses).unwrap()).unwrap();
        path
    }

    fn options(dir: &TempDir, dry_run: bool) -> MarkupOptions {
        MarkupOptions {
            verses_dir: dir.path().to_path_buf(),
            field: "tj".to_string(),
            max_attempts: 3,
            dry_run,
        }
    }

    fn no_delay() -> FixedInterval {
        FixedInterval::new(Duration::ZERO)
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_adds_missing_markup_and_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_verses(
            &dir,
            1,
            &json!([
                {"s": 1, "a": 1, "t": "بِسْمِ"},
                {"s": 1, "a": 2, "t": "ٱلْحَمْدُ"}
            ]),
        );
        let source = FakeMarkupSource::with(&["1:1", "1:2"]);
        let mut job = MarkupJob::new(&source, no_delay(), options(&dir, false));

        let summary = job.run([id(1)]).await.unwrap();

        assert_eq!(
            summary,
            MarkupSummary { sections_updated: 1, verses_updated: 2, verses_failed: 0, verses_skipped: 0 }
        );
        let file = VerseFile::load(&path).unwrap();
        assert_eq!(file.verses[1].text("tj"), Some("<tajweed>1:2</tajweed>"));
        assert_eq!(file.verses[0].text("t"), Some("بِسْمِ"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.find("\"t\"").unwrap() < content.find("\"tj\"").unwrap());
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_verses_with_markup_are_not_requested() {
        let dir = TempDir::new().unwrap();
        write_verses(
            &dir,
            2,
            &json!([
                {"s": 2, "a": 1, "tj": "done"},
                {"s": 2, "a": 2},
                {"s": 2}
            ]),
        );
        let source = FakeMarkupSource::with(&["2:1", "2:2"]);
        let mut job = MarkupJob::new(&source, no_delay(), options(&dir, false));

        let summary = job.run([id(2)]).await.unwrap();

        assert_eq!(source.requests(), vec!["2:2"]);
        expect_that!(summary.verses_updated, eq(1));
        expect_that!(summary.verses_skipped, eq(2));
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_transport_failure_retried_then_counted_as_failed() {
        let dir = TempDir::new().unwrap();
        let path = write_verses(&dir, 3, &json!([{"s": 3, "a": 1}, {"s": 3, "a": 2}]));
        let before = std::fs::read_to_string(&path).unwrap();
        let source = FakeMarkupSource::with(&["3:1", "3:2"]).fail_first("3:1", 10).fail_first("3:2", 2);
        let mut job = MarkupJob::new(&source, no_delay(), options(&dir, true));

        let summary = job.run([id(3)]).await.unwrap();

        let requests = source.requests();
        expect_that!(requests.iter().filter(|k| k.as_str() == "3:1").count(), eq(3));
        expect_that!(requests.iter().filter(|k| k.as_str() == "3:2").count(), eq(3));
        expect_that!(summary.verses_failed, eq(1));
        expect_that!(summary.verses_updated, eq(1));
        // dry run
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_missing_and_broken_files_do_not_stop_the_job() {
        let dir = TempDir::new().unwrap();
        std::fs::write(verse_file_path(dir.path(), id(5)), "{\"not\": \"an array\"}").unwrap();
        write_verses(&dir, 6, &json!([{"s": 6, "a": 1}]));
        let source = FakeMarkupSource::with(&["6:1"]);
        let mut job = MarkupJob::new(&source, no_delay(), options(&dir, false));

        let summary = job.run([id(4), id(5), id(6)]).await.unwrap();

        expect_that!(summary.sections_updated, eq(1));
        expect_that!(summary.verses_updated, eq(1));
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_missing_verses_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(&dir, false);
        opts.verses_dir = dir.path().join("absent");
        let source = FakeMarkupSource::default();
        let mut job = MarkupJob::new(&source, no_delay(), opts);

        let result = job.run(SectionId::all()).await;

        expect_that!(matches!(result, Err(PipelineError::Io(_))), eq(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_by_rate_limit() {
        let dir = TempDir::new().unwrap();
        write_verses(&dir, 7, &json!([{"s": 7, "a": 1}, {"s": 7, "a": 2}, {"s": 7, "a": 3}]));
        let source = FakeMarkupSource::with(&["7:1", "7:2", "7:3"]);
        let limit = FixedInterval::new(Duration::from_millis(100));
        let mut job = MarkupJob::new(&source, limit, options(&dir, true));
        let start = tokio::time::Instant::now();

        job.run([id(7)]).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[googletest::test]
    fn test_options_from_config() {
        let opts = MarkupOptions::new(&MarkupConfig::default(), PathBuf::from("/tmp/verses"), true);

        expect_that!(opts.field.as_str(), eq("tj"));
        expect_that!(opts.max_attempts, eq(3));
        expect_that!(opts.dry_run, eq(true));
    }
}
