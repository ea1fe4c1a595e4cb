//! Command-line entry points
//!
//! ```text
//! surah-meanings [OPTIONS] <COMMAND>
//! ```

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::config::{
    ConfigManager,
    ConfigOverrides,
};
use crate::error::PipelineError;
use crate::input::AuthoritativeOverlay;
use crate::pipeline::{
    self,
    Classification,
    DefaultLanguagePolicy,
    FallbackDetected,
    MarkupJob,
    MarkupOptions,
    MarkupSummary,
    OverlayUpdate,
    SnapshotDiff,
    VerificationReport,
};
use crate::remote::{
    ConfiguredRateLimit,
    QuranApiClient,
};
use crate::snapshot::Snapshot;
use crate::types::{
    LocaleCode,
    SectionId,
};

/// Help text printed for `--help` and usage errors.
pub const USAGE: &str = "\
surah-meanings: maintain the localized surah meanings dataset

USAGE:
    surah-meanings [OPTIONS] <COMMAND>

COMMANDS:
    fetch          Fetch every locale and rewrite the snapshot
    diff <A> <B>   Compare two snapshot files
    overlay        Apply the authoritative spreadsheet to the snapshot
    verify         Check the snapshot against the authoritative spreadsheet
    markup         Add verse markup to the per-surah verse files

OPTIONS:
    --root <DIR>          Workspace root holding .surah-meanings.json [default: .]
    --config <PATH>       Settings file to use instead of .surah-meanings.json
    --snapshot <PATH>     Snapshot file
    --spreadsheet <PATH>  Authoritative spreadsheet
    --locale <CODE>       Locale compared against the spreadsheet
    --dry-run             Do everything except writing files
    --limit <N>           markup: only the first N surahs
    -v, --verbose         Debug logging (RUST_LOG takes precedence)
    -h, --help            Print this help
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch,
    Diff { a: PathBuf, b: PathBuf },
    Overlay,
    Verify,
    Markup,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub spreadsheet: Option<PathBuf>,
    pub locale: Option<LocaleCode>,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub verbose: bool,
}

impl CliArgs {
    /// Settings the flags replace in `.surah-meanings.json`.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            snapshot_path: self.snapshot.clone(),
            spreadsheet_path: self.spreadsheet.clone(),
            overlay_locale: self.locale.clone(),
        }
    }
}

/// Command line that cannot be run. Reported with exit code 2.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("help requested")]
    Help,

    #[error("No command given")]
    MissingCommand,

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Unexpected arguments: {}", .0.join(" "))]
    UnexpectedArguments(Vec<String>),

    #[error(transparent)]
    Args(#[from] pico_args::Error),
}

/// Parses the process arguments (program name already removed).
///
/// # Errors
/// `UsageError` for help requests, unknown commands, bad values or leftovers.
pub fn parse_args(mut args: pico_args::Arguments) -> Result<CliArgs, UsageError> {
    if args.contains(["-h", "--help"]) {
        return Err(UsageError::Help);
    }

    // options may appear anywhere, so they go first and the command is the first free argument left
    let verbose = args.contains(["-v", "--verbose"]);
    let dry_run = args.contains("--dry-run");
    let root = args.opt_value_from_str("--root")?;
    let config = args.opt_value_from_str("--config")?;
    let snapshot = args.opt_value_from_str("--snapshot")?;
    let spreadsheet = args.opt_value_from_str("--spreadsheet")?;
    let locale = args.opt_value_from_str::<_, String>("--locale")?.map(LocaleCode::new);
    let limit = args.opt_value_from_str("--limit")?;
    let name = args.subcommand()?.ok_or(UsageError::MissingCommand)?;

    let command = match name.as_str() {
        "fetch" => Command::Fetch,
        "diff" => Command::Diff { a: args.free_from_str()?, b: args.free_from_str()? },
        "overlay" => Command::Overlay,
        "verify" => Command::Verify,
        "markup" => Command::Markup,
        _ => return Err(UsageError::UnknownCommand(name)),
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(UsageError::UnexpectedArguments(
            rest.iter().map(|s| s.to_string_lossy().into_owned()).collect(),
        ));
    }

    Ok(CliArgs { command, root, config, snapshot, spreadsheet, locale, dry_run, limit, verbose })
}

/// Result of one command, printed to stdout.
#[derive(Debug, Clone)]
pub enum Report {
    Fetched {
        path: PathBuf,
        written: bool,
        coverage: Vec<(LocaleCode, usize)>,
        fallbacks: Vec<FallbackDetected>,
    },
    Diff(SnapshotDiff),
    Overlay {
        path: PathBuf,
        written: bool,
        updates: Vec<OverlayUpdate>,
    },
    Verified(VerificationReport),
    Markup(MarkupSummary),
}

/// Loads the workspace configuration, applies CLI overrides and runs the command.
///
/// # Errors
/// Configuration errors and the errors of the selected stage.
pub async fn run(args: &CliArgs) -> Result<Report, PipelineError> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let manager = ConfigManager::load(root, args.config.as_deref(), &args.overrides())?;
    let settings = manager.settings();
    let snapshot_path = manager.snapshot_path();

    match &args.command {
        Command::Fetch => {
            let client = QuranApiClient::new(settings)?;
            let default = settings
                .fetch_order()
                .first()
                .copied()
                .ok_or_else(|| PipelineError::MissingLocale(settings.default_locale.clone()))?;
            let policy = DefaultLanguagePolicy::new(default);

            let run = pipeline::fetch_all(&client, settings, &policy).await?;
            let snapshot =
                pipeline::merge(&run.results, &settings.locale_codes(), &settings.default_locale)?;
            if !args.dry_run {
                snapshot.save_atomic(&snapshot_path)?;
            }

            let coverage = settings
                .locale_codes()
                .into_iter()
                .map(|locale| {
                    let count = snapshot.coverage(&locale);
                    (locale, count)
                })
                .collect();
            Ok(Report::Fetched {
                path: snapshot_path,
                written: !args.dry_run,
                coverage,
                fallbacks: run.fallbacks,
            })
        }
        Command::Diff { a, b } => {
            let left = Snapshot::load(&manager.resolve(a))?;
            let right = Snapshot::load(&manager.resolve(b))?;
            Ok(Report::Diff(pipeline::diff(&left, &right, &settings.overlay.locale)))
        }
        Command::Overlay => {
            let snapshot = Snapshot::load(&snapshot_path)?;
            let overlay = AuthoritativeOverlay::load(&manager.spreadsheet_path(), &settings.overlay)?;
            let outcome = pipeline::apply_overlay(&snapshot, &overlay, &settings.overlay.locale);
            let written = !args.dry_run && pipeline::persist_overlay(&outcome, &snapshot_path)?;
            Ok(Report::Overlay { path: snapshot_path, written, updates: outcome.updates })
        }
        Command::Verify => {
            let snapshot = Snapshot::load(&snapshot_path)?;
            let overlay = AuthoritativeOverlay::load(&manager.spreadsheet_path(), &settings.overlay)?;
            Ok(Report::Verified(pipeline::verify(&snapshot, &overlay, &settings.overlay.locale)))
        }
        Command::Markup => {
            let client = QuranApiClient::new(settings)?;
            let rate_limit = ConfiguredRateLimit::from(settings.markup.rate_limit);
            let options = MarkupOptions::new(&settings.markup, manager.verses_dir(), args.dry_run);
            let sections = SectionId::all().take(args.limit.unwrap_or(usize::MAX));

            let summary = MarkupJob::new(&client, rate_limit, options).run(sections).await?;
            Ok(Report::Markup(summary))
        }
    }
}

/// Shows at most this many entries of long lists.
const LIST_LIMIT: usize = 10;

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetched { path, written, coverage, fallbacks } => {
                for fallback in fallbacks {
                    writeln!(
                        f,
                        "fallback: '{}' returned '{}' content, using '{}'",
                        fallback.requested, fallback.declared_language, fallback.substitute
                    )?;
                }
                for (locale, count) in coverage {
                    writeln!(f, "{locale}: {count}/{} non-empty", SectionId::all().count())?;
                }
                write_target(f, path, *written)
            }
            Self::Diff(diff) => fmt_diff(f, diff),
            Self::Overlay { path, written, updates } => {
                writeln!(f, "{} update(s)", updates.len())?;
                for update in updates.iter().take(LIST_LIMIT) {
                    writeln!(f, "  {}: '{}' -> '{}'", update.section, update.previous, update.current)?;
                }
                if *written || updates.is_empty() {
                    write_target(f, path, *written)
                } else {
                    write!(f, "dry run, {} not written", path.display())
                }
            }
            Self::Verified(report) => {
                let total = report.sections.len();
                writeln!(f, "correct: {}/{total}", report.correct())?;
                writeln!(f, "mismatches: {}", report.mismatched())?;
                writeln!(f, "missing in source: {}", report.missing_in_source())?;
                for entry in report.mismatches().take(LIST_LIMIT) {
                    if let Classification::Mismatch { expected, actual } = &entry.classification {
                        writeln!(f, "  {}: expected '{expected}', found '{actual}'", entry.section)?;
                    }
                }
                Ok(())
            }
            Self::Markup(summary) => write!(
                f,
                "updated {} verse(s) in {} file(s), {} failed, {} skipped",
                summary.verses_updated,
                summary.sections_updated,
                summary.verses_failed,
                summary.verses_skipped
            ),
        }
    }
}

/// Final line naming the file that was (or was not) written.
fn write_target(f: &mut fmt::Formatter<'_>, path: &Path, written: bool) -> fmt::Result {
    if written {
        write!(f, "wrote {}", path.display())
    } else {
        write!(f, "{} unchanged", path.display())
    }
}

/// Sections only on one side, per-field differences, then coverage.
fn fmt_diff(f: &mut fmt::Formatter<'_>, diff: &SnapshotDiff) -> fmt::Result {
    if !diff.only_in_a.is_empty() {
        writeln!(f, "only in A: {}", join_sections(&diff.only_in_a))?;
    }
    if !diff.only_in_b.is_empty() {
        writeln!(f, "only in B: {}", join_sections(&diff.only_in_b))?;
    }
    writeln!(f, "{} field difference(s)", diff.differences.len())?;
    for difference in diff.differences.iter().take(LIST_LIMIT) {
        writeln!(
            f,
            "  {} [{}]: '{}' vs '{}'",
            difference.section, difference.locale, difference.in_a, difference.in_b
        )?;
    }
    writeln!(
        f,
        "{} coverage: A {}, B {}",
        diff.coverage.locale, diff.coverage.in_a, diff.coverage.in_b
    )?;
    write!(f, "identical {}: {}", diff.coverage.locale, diff.identical)
}

/// Comma-separated section numbers.
fn join_sections(sections: &[SectionId]) -> String {
    sections.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::ffi::OsString;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::full_snapshot;

    fn parse(args: &[&str]) -> Result<CliArgs, UsageError> {
        parse_args(pico_args::Arguments::from_vec(args.iter().map(OsString::from).collect()))
    }

    #[googletest::test]
    fn test_parse_diff_with_options() {
        let args = parse(&["diff", "a.json", "b.json", "--locale", "ja", "-v"]).unwrap();

        assert_eq!(
            args.command,
            Command::Diff { a: PathBuf::from("a.json"), b: PathBuf::from("b.json") }
        );
        assert_eq!(args.locale, Some(LocaleCode::from("ja")));
        expect_that!(args.verbose, eq(true));
        expect_that!(args.dry_run, eq(false));
    }

    #[googletest::test]
    fn test_parse_markup_limit_and_dry_run() {
        let args = parse(&["--dry-run", "markup", "--limit", "3"]).unwrap();

        assert_eq!(args.command, Command::Markup);
        assert_eq!(args.limit, Some(3));
        expect_that!(args.dry_run, eq(true));
    }

    #[rstest]
    #[case::none(&[])]
    #[case::unknown(&["upload"])]
    #[case::diff_missing_file(&["diff", "a.json"])]
    #[case::leftover(&["verify", "extra"])]
    #[case::bad_limit(&["markup", "--limit", "many"])]
    #[case::help(&["fetch", "--help"])]
    fn test_parse_rejects(#[case] args: &[&str]) {
        assert!(parse(args).is_err());
    }

    fn args_for(command: Command, root: &Path) -> CliArgs {
        CliArgs {
            command,
            root: Some(root.to_path_buf()),
            config: None,
            snapshot: None,
            spreadsheet: None,
            locale: None,
            dry_run: false,
            limit: None,
            verbose: false,
        }
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_run_diff_resolves_paths_against_root() {
        let dir = TempDir::new().unwrap();
        let a = full_snapshot(&["en", "id", "zh", "ja"]);
        let mut b = a.clone();
        b.get_mut(SectionId::new(5).unwrap()).unwrap().set(LocaleCode::from("id"), "lima");
        a.save_atomic(&dir.path().join("a.json")).unwrap();
        b.save_atomic(&dir.path().join("b.json")).unwrap();
        let command = Command::Diff { a: PathBuf::from("a.json"), b: PathBuf::from("b.json") };

        let report = run(&args_for(command, dir.path())).await.unwrap();

        let Report::Diff(diff) = report else {
            panic!("expected a diff report");
        };
        expect_that!(diff.differences.len(), eq(1));
        expect_that!(diff.identical, eq(114));
    }

    #[googletest::test]
    #[tokio::test]
    async fn test_run_rejects_unknown_locale_override() {
        let dir = TempDir::new().unwrap();
        let mut args = args_for(Command::Verify, dir.path());
        args.locale = Some(LocaleCode::from("fr"));

        let result = run(&args).await;

        expect_that!(matches!(result, Err(PipelineError::Config(_))), eq(true));
    }

    #[googletest::test]
    fn test_markup_report_line() {
        let report = Report::Markup(MarkupSummary {
            sections_updated: 2,
            verses_updated: 10,
            verses_failed: 1,
            verses_skipped: 4,
        });

        assert_eq!(report.to_string(), "updated 10 verse(s) in 2 file(s), 1 failed, 4 skipped");
    }
}
