//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    PipelineSettings,
};

/// Name of the settings file looked up in the workspace root.
pub(super) const CONFIG_FILE_NAME: &str = ".surah-meanings.json";

/// ワークスペースルートの `.surah-meanings.json` を読み込む
///
/// ファイルがなければ `Ok(None)`。
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<PipelineSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "No settings file in workspace");
        return Ok(None);
    }
    load_file(&config_path).map(Some)
}

/// 指定された設定ファイルを読み込む（`--config`）
///
/// ワークスペースの設定ファイルと違い、存在しなければエラー。
/// 省略されたフィールドはデフォルト値になる。
pub(super) fn load_file(path: &Path) -> Result<PipelineSettings, ConfigError> {
    tracing::debug!(path = %path.display(), "Reading settings file");

    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
