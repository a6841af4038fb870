//! Translation Log Module
//!
//! 1ファイル分の翻訳ログを蓄積するモジュール。
//!
//! 書き換え処理は[`NodeOutcome`]を返すだけで、ログへの追記はオーケストレーターが行います。
//! ログは追記のみで、重複の排除は行いません。

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::LogStatus;
use crate::error::XlsxlateError;

/// シート以外のパート（共有文字列、描画、グラフ）のログに使用するシート名
pub const XML_LAYER_SHEET_NAME: &str = "<xml-layer>";

/// 失敗時に記録するエンジン名
pub(crate) const NO_ENGINE: &str = "none";

/// 翻訳ログの1エントリ
///
/// 翻訳を試みたテキスト1件につき1エントリが作成されます。
/// 空白のみのテキストはエントリを作りません。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationLogEntry {
    /// 入力ファイル名
    pub file_name: String,
    /// シート名（シート以外のパートでは`"<xml-layer>"`）
    pub sheet_name: String,
    /// ワークブック内でのテキストの位置（例: `cell:A1`, `sheet_title`）
    pub object_id: String,
    pub original_text: String,
    /// 翻訳後のテキスト（失敗時は元のテキスト）
    pub translated_text: String,
    /// 翻訳エンジン名（失敗時は`"none"`）
    pub engine: String,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// 1ノードの書き換え結果
///
/// ファイル名・シート名・時刻は、ログへの追記時に付与されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeOutcome {
    pub object_id: String,
    pub original_text: String,
    pub translated_text: String,
    pub engine: String,
    pub error_message: Option<String>,
}

impl NodeOutcome {
    pub fn ok(object_id: String, original_text: String, translated_text: String, engine: String) -> Self {
        Self {
            object_id,
            original_text,
            translated_text,
            engine,
            error_message: None,
        }
    }

    /// 失敗結果（テキストは元のまま維持される）
    pub fn error(object_id: String, original_text: String, message: String) -> Self {
        Self {
            object_id,
            translated_text: original_text.clone(),
            original_text,
            engine: NO_ENGINE.to_string(),
            error_message: Some(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error_message.is_none()
    }
}

/// 1ファイル分の翻訳ログ
#[derive(Debug, Clone, Default)]
pub(crate) struct TranslationLog {
    file_name: String,
    entries: Vec<TranslationLogEntry>,
}

impl TranslationLog {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            entries: Vec::new(),
        }
    }

    /// 書き換え結果をシート名付きで追記
    pub fn record(&mut self, sheet_name: &str, outcome: NodeOutcome) {
        let status = if outcome.is_ok() {
            LogStatus::Ok
        } else {
            LogStatus::Error
        };
        self.entries.push(TranslationLogEntry {
            file_name: self.file_name.clone(),
            sheet_name: sheet_name.to_string(),
            object_id: outcome.object_id,
            original_text: outcome.original_text,
            translated_text: outcome.translated_text,
            engine: outcome.engine,
            status,
            error_message: outcome.error_message,
            timestamp: Utc::now(),
        });
    }

    pub fn record_all(&mut self, sheet_name: &str, outcomes: Vec<NodeOutcome>) {
        for outcome in outcomes {
            self.record(sheet_name, outcome);
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[TranslationLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_entries(self) -> Vec<TranslationLogEntry> {
        self.entries
    }
}

/// ログエントリをJSON配列として書き出す
///
/// # 使用例
///
/// ```rust
/// use xlsxlate::write_log_json;
///
/// let mut out = Vec::new();
/// write_log_json(&[], &mut out).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "[]");
/// ```
pub fn write_log_json<W: Write>(
    entries: &[TranslationLogEntry],
    writer: W,
) -> Result<(), XlsxlateError> {
    serde_json::to_writer_pretty(writer, entries).map_err(std::io::Error::from)?;
    Ok(())
}
