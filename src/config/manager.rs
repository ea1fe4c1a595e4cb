//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    PipelineSettings,
    loader,
};
use crate::types::LocaleCode;

/// コマンドライン引数による設定の上書き
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// `--snapshot`
    pub snapshot_path: Option<PathBuf>,
    /// `--spreadsheet`
    pub spreadsheet_path: Option<PathBuf>,
    /// `--locale`
    pub overlay_locale: Option<LocaleCode>,
}

impl ConfigOverrides {
    /// 指定された項目だけを `settings` に反映する
    fn apply(&self, settings: &mut PipelineSettings) {
        if let Some(path) = &self.snapshot_path {
            settings.snapshot_path.clone_from(path);
        }
        if let Some(path) = &self.spreadsheet_path {
            settings.overlay.spreadsheet_path.clone_from(path);
        }
        if let Some(locale) = &self.overlay_locale {
            settings.overlay.locale = locale.clone();
        }
    }
}

/// ワークスペースの設定と、その設定に含まれる相対パスの解決を担う
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 検証済みの設定
    settings: PipelineSettings,

    /// 相対パスの基準となるワークスペースのルート
    workspace_root: PathBuf,
}

impl ConfigManager {
    /// 設定ファイルを読み込み、上書きを適用してから検証する
    ///
    /// `settings_file` が指定されればそれを、なければワークスペースの
    /// `.surah-meanings.json` を読む。どちらもなければデフォルト値。
    ///
    /// # Errors
    /// - ファイル読み込みエラー（`settings_file` が存在しない場合を含む）
    /// - JSON パースエラー
    /// - バリデーションエラー（上書き後の値も対象）
    pub fn load(
        workspace_root: PathBuf,
        settings_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        tracing::debug!(root = %workspace_root.display(), ?settings_file, "Loading settings");

        let mut settings = match settings_file {
            Some(path) => loader::load_file(&resolve_against(&workspace_root, path))?,
            None => loader::load_from_workspace(&workspace_root)?.unwrap_or_default(),
        };
        overrides.apply(&mut settings);

        Self::with_settings(workspace_root, settings)
    }

    /// 設定を直接指定して作成する
    ///
    /// # Errors
    /// - バリデーションエラー
    pub fn with_settings(
        workspace_root: PathBuf,
        settings: PipelineSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(?settings, "Settings loaded");

        Ok(Self { settings, workspace_root })
    }

    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// 相対パスをワークスペースルート基準で解決する
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_against(&self.workspace_root, path)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.resolve(&self.settings.snapshot_path)
    }

    #[must_use]
    pub fn spreadsheet_path(&self) -> PathBuf {
        self.resolve(&self.settings.overlay.spreadsheet_path)
    }

    #[must_use]
    pub fn verses_dir(&self) -> PathBuf {
        self.resolve(&self.settings.markup.verses_dir)
    }
}

/// `path` が相対パスなら `root` に連結する
fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_relative() { root.join(path) } else { path.to_path_buf() }
}
