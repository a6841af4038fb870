//! Translator Module
//!
//! 翻訳エンジンとの境界となるトレイトを定義するモジュール。
//!
//! 書き換え処理はテキスト1件ごとに[`Translator::translate`]を呼び出します。
//! 失敗はそのノードのログエントリ（`status = error`）として記録され、
//! 元のテキストが維持されます。

use thiserror::Error;

/// 翻訳結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// 翻訳後のテキスト
    pub text: String,
    /// 翻訳を行ったエンジンの名前（ログに記録されます）
    pub engine: String,
}

impl Translation {
    pub fn new(text: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            engine: engine.into(),
        }
    }
}

/// 1件のテキストの翻訳失敗
///
/// ファイル全体の処理は中断されません。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TranslateError {
    message: String,
}

impl TranslateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// エラーメッセージ
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// 翻訳エンジン
///
/// `object_id`はワークブック内でのテキストの位置（例: `cell:B3`）で、
/// キャッシュのキーやデバッグ用途に使用できます。
///
/// `Fn(&str, &str) -> Result<Translation, TranslateError>`を満たすクロージャも
/// そのまま翻訳エンジンとして使用できます。
///
/// # 使用例
///
/// ```rust
/// use xlsxlate::{Translation, TranslateError, Translator};
///
/// let shout = |text: &str, _object_id: &str| -> Result<Translation, TranslateError> {
///     Ok(Translation::new(text.to_uppercase(), "shout"))
/// };
/// let translated = shout.translate("hello", "cell:A1").unwrap();
/// assert_eq!(translated.text, "HELLO");
/// assert_eq!(translated.engine, "shout");
/// ```
pub trait Translator {
    fn translate(&self, text: &str, object_id: &str) -> Result<Translation, TranslateError>;
}

impl<F> Translator for F
where
    F: Fn(&str, &str) -> Result<Translation, TranslateError>,
{
    fn translate(&self, text: &str, object_id: &str) -> Result<Translation, TranslateError> {
        self(text, object_id)
    }
}

/// テキストをそのまま返す翻訳エンジン
///
/// 書き換え経路の検証用です。出力パッケージは入力と同じ内容になります。
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str, _object_id: &str) -> Result<Translation, TranslateError> {
        Ok(Translation::new(text, "identity"))
    }
}
