//! Pipeline configuration loaded from `.surah-meanings.json`.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Configuration types and settings
mod types;

pub use manager::{
    ConfigManager,
    ConfigOverrides,
};
pub use types::{
    ConfigError,
    LocaleSettings,
    MarkupConfig,
    OverlayConfig,
    PipelineSettings,
    RateLimitConfig,
    ValidationError,
};
