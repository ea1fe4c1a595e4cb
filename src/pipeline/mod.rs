//! Pipeline stages
//!
//! Each stage takes its inputs by reference and returns a new value; only
//! `save_atomic` / `persist_overlay` and the markup job touch the disk.
pub mod differ;
pub mod fallback;
pub mod fetcher;
pub mod markup;
pub mod merger;
pub mod overlay;
pub mod verifier;

pub use differ::{
    Coverage,
    FieldDifference,
    SnapshotDiff,
    diff,
};
pub use fallback::{
    DefaultLanguagePolicy,
    FallbackDetected,
    FallbackOutcome,
    FallbackPolicy,
    correct_fallback,
};
pub use fetcher::{
    FetchRun,
    fetch_all,
    fetch_locale,
};
pub use markup::{
    MarkupJob,
    MarkupOptions,
    MarkupSummary,
};
pub use merger::merge;
pub use overlay::{
    OverlayOutcome,
    OverlayUpdate,
    apply_overlay,
    persist_overlay,
};
pub use verifier::{
    Classification,
    VerificationReport,
    VerifiedSection,
    verify,
};
