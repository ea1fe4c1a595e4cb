//! surah-meanings
//!
//! 114 surah の短い意味（en / id / zh / ja など）を取得・統合・検証するバッチパイプライン

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod remote;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use error::PipelineError;
pub use snapshot::{
    LocalizedMeaning,
    Snapshot,
};
pub use types::{
    LocaleCode,
    SectionId,
};
