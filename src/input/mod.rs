//! Transient inputs: remote responses, the authoritative spreadsheet and verse files.
pub mod chapters;
pub mod overlay;
pub mod verses;

pub use chapters::{
    ChapterDto,
    RawEntry,
    RawLocaleFetchResult,
};
pub use overlay::AuthoritativeOverlay;
pub use verses::{
    Verse,
    VerseFile,
};
