//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use crate::input::chapters::{
    ChapterDto,
    RawLocaleFetchResult,
    TranslatedNameDto,
};
use crate::snapshot::{
    LocalizedMeaning,
    Snapshot,
};
use crate::types::{
    LocaleCode,
    SectionId,
};

/// テスト用の chapters レスポンスを作成する
///
/// # Arguments
/// * `language_name` - レスポンスが宣言する言語名（例: "english"）
/// * `name` - surah 番号から表示名を作る関数
pub(crate) fn chapter_dtos(language_name: &str, name: impl Fn(u16) -> String) -> Vec<ChapterDto> {
    SectionId::all()
        .map(|id| ChapterDto {
            id: id.get(),
            translated_name: TranslatedNameDto {
                language_name: language_name.to_string(),
                name: Some(name(id.get())),
            },
        })
        .collect()
}

/// テスト用の `RawLocaleFetchResult` を作成する（値は `"<locale> <id>"`）
pub(crate) fn raw_result(locale: &str, language_name: &str) -> RawLocaleFetchResult {
    RawLocaleFetchResult::from_chapters(
        LocaleCode::from(locale),
        chapter_dtos(language_name, |id| format!("{locale} {id}")),
    )
    .unwrap_or_else(|e| panic!("invalid test chapters: {e}"))
}

/// 全 114 surah を持つ Snapshot を作成する（値は `"<locale> <id>"`）
pub(crate) fn full_snapshot(locale_codes: &[&str]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for id in SectionId::all() {
        let meaning: LocalizedMeaning =
            locale_codes.iter().map(|code| (*code, format!("{code} {id}"))).collect();
        snapshot.insert(id, meaning);
    }
    snapshot
}

pub(crate) fn locales(codes: &[&str]) -> Vec<LocaleCode> {
    codes.iter().copied().map(LocaleCode::from).collect()
}
