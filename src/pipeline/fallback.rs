//! Detection of silent default-locale substitution
//!
//! The remote source answers an unsupported locale with English content instead
//! of an error. Each chapter declares the language it is written in, so a
//! response for `ja` declaring `english` is a fallback. Such a result is replaced
//! wholesale by the default-locale result rather than merged as if it were
//! Japanese.

use crate::config::LocaleSettings;
use crate::error::PipelineError;
use crate::input::RawLocaleFetchResult;
use crate::types::LocaleCode;

/// Decides from the declared language tag whether a response is default-locale content.
pub trait FallbackPolicy {
    fn is_fallback(&self, declared_tag: &str, requested: &LocaleCode) -> bool;
}

impl<F> FallbackPolicy for F
where
    F: Fn(&str, &LocaleCode) -> bool,
{
    fn is_fallback(&self, declared_tag: &str, requested: &LocaleCode) -> bool {
        self(declared_tag, requested)
    }
}

/// Flags responses declaring the default locale's code or language name.
#[derive(Debug, Clone)]
pub struct DefaultLanguagePolicy {
    code: LocaleCode,
    language_name: String,
}

impl DefaultLanguagePolicy {
    #[must_use]
    pub fn new(default: &LocaleSettings) -> Self {
        Self { code: default.code.clone(), language_name: default.language_name.to_lowercase() }
    }
}

impl FallbackPolicy for DefaultLanguagePolicy {
    fn is_fallback(&self, declared_tag: &str, requested: &LocaleCode) -> bool {
        if requested == &self.code {
            return false;
        }
        let declared = declared_tag.trim().to_lowercase();
        self.code.matches_tag(&declared)
            || (!self.language_name.is_empty() && declared.contains(&self.language_name))
    }
}

/// Warning raised when a result was replaced by default-locale content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackDetected {
    pub requested: LocaleCode,
    pub declared_language: String,
    pub substitute: LocaleCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// The response is in the requested locale.
    Accepted(RawLocaleFetchResult),
    /// The response was default-locale content and has been replaced.
    Substituted { result: RawLocaleFetchResult, warning: FallbackDetected },
}

impl FallbackOutcome {
    #[must_use]
    pub fn into_result(self) -> RawLocaleFetchResult {
        match self {
            Self::Accepted(result) | Self::Substituted { result, .. } => result,
        }
    }

    #[must_use]
    pub const fn warning(&self) -> Option<&FallbackDetected> {
        match self {
            Self::Accepted(_) => None,
            Self::Substituted { warning, .. } => Some(warning),
        }
    }
}

/// Replaces `result` by `default_result` when `policy` reports a fallback.
///
/// Results without any non-empty meaning, or without a declared tag, are
/// accepted as they are.
///
/// # Errors
/// `PipelineError::Schema` when the declared language is neither the requested
/// locale nor the default one.
pub fn correct_fallback<P>(
    result: RawLocaleFetchResult,
    default_result: &RawLocaleFetchResult,
    requested: &LocaleSettings,
    policy: &P,
) -> Result<FallbackOutcome, PipelineError>
where
    P: FallbackPolicy + ?Sized,
{
    let declared = result.declared_language().unwrap_or_default().trim().to_string();
    if result.non_empty_count() == 0 || declared.is_empty() {
        return Ok(FallbackOutcome::Accepted(result));
    }

    if policy.is_fallback(&declared, &requested.code) {
        let warning = FallbackDetected {
            requested: requested.code.clone(),
            declared_language: declared,
            substitute: default_result.locale().clone(),
        };
        tracing::warn!(
            requested = %warning.requested,
            declared = %warning.declared_language,
            substitute = %warning.substitute,
            "Remote source returned default-locale content; using it as fallback"
        );
        return Ok(FallbackOutcome::Substituted {
            result: default_result.relabelled(requested.code.clone()),
            warning,
        });
    }

    if !declares_locale(&declared, requested) {
        return Err(PipelineError::Schema(format!(
            "requested locale '{}' but the response declares unrequested language '{declared}'",
            requested.code
        )));
    }

    Ok(FallbackOutcome::Accepted(result))
}

/// Whether `declared` names `locale` by code or by language name.
fn declares_locale(declared: &str, locale: &LocaleSettings) -> bool {
    locale.code.matches_tag(declared) || locale.language_name.eq_ignore_ascii_case(declared)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::test_utils::raw_result;
    use crate::types::SectionId;

    fn settings(code: &str, name: &str) -> LocaleSettings {
        serde_json::from_value(serde_json::json!({"code": code, "languageName": name})).unwrap()
    }

    fn english_policy() -> DefaultLanguagePolicy {
        DefaultLanguagePolicy::new(&settings("en", "english"))
    }

    #[rstest]
    #[case::english_name("english", "ja", true)]
    #[case::english_name_upper("English", "ja", true)]
    #[case::english_code("en", "zh", true)]
    #[case::requested_language("japanese", "ja", false)]
    #[case::default_requested("english", "en", false)]
    #[case::other_language("indonesian", "ja", false)]
    fn test_default_language_policy(
        #[case] declared: &str,
        #[case] requested: &str,
        #[case] expected: bool,
    ) {
        let policy = english_policy();

        assert_that!(policy.is_fallback(declared, &LocaleCode::from(requested)), eq(expected));
    }

    #[googletest::test]
    fn test_fallback_replaced_with_default_result() {
        let english = raw_result("en", "english");
        let japanese = raw_result("ja", "english");

        let outcome =
            correct_fallback(japanese, &english, &settings("ja", "japanese"), &english_policy())
                .unwrap();

        let warning = outcome.warning().cloned().unwrap();
        expect_that!(warning.requested.as_str(), eq("ja"));
        expect_that!(warning.declared_language.as_str(), eq("english"));
        let result = outcome.into_result();
        expect_that!(result.locale().as_str(), eq("ja"));
        expect_that!(result.meaning(SectionId::new(1).unwrap()), some(eq("en 1")));
    }

    #[googletest::test]
    fn test_requested_language_accepted() {
        let english = raw_result("en", "english");
        let indonesian = raw_result("id", "indonesian");

        let outcome = correct_fallback(
            indonesian.clone(),
            &english,
            &settings("id", "indonesian"),
            &english_policy(),
        )
        .unwrap();

        expect_that!(outcome.warning().is_none(), eq(true));
        expect_that!(outcome.into_result() == indonesian, eq(true));
    }

    #[googletest::test]
    fn test_unrequested_language_is_schema_error() {
        let english = raw_result("en", "english");
        let labelled_ja = raw_result("ja", "chinese");

        let result =
            correct_fallback(labelled_ja, &english, &settings("ja", "japanese"), &english_policy());

        expect_that!(matches!(result, Err(PipelineError::Schema(_))), eq(true));
    }

    #[googletest::test]
    fn test_empty_result_is_never_fallback() {
        let english = raw_result("en", "english");
        let empty = crate::input::RawLocaleFetchResult::from_chapters(
            LocaleCode::from("ja"),
            crate::test_utils::chapter_dtos("english", |_| String::new()),
        )
        .unwrap();

        let outcome =
            correct_fallback(empty, &english, &settings("ja", "japanese"), &english_policy())
                .unwrap();

        expect_that!(outcome.warning().is_none(), eq(true));
    }

    #[googletest::test]
    fn test_closure_policy_can_replace_default() {
        let english = raw_result("en", "english");
        let japanese = raw_result("ja", "japanese");
        let always = |_: &str, _: &LocaleCode| true;

        let outcome =
            correct_fallback(japanese, &english, &settings("ja", "japanese"), &always).unwrap();

        expect_that!(outcome.warning().is_some(), eq(true));
    }
}
