//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。
//!
//! ノード単位の翻訳失敗（[`crate::TranslateError`]）はここには含まれません。
//! それらはログエントリとして記録され、ファイルの処理は継続されます。

use thiserror::Error;

use crate::log::TranslationLogEntry;

/// xlsxlateクレート全体で使用するエラー型
///
/// ファイル単位で致命的なエラーのみを表します。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー
/// - `MalformedPackage`: 入力がZIPアーカイブとして読めない
/// - `MalformedPart`: 書き換え対象パートのXMLが解析できない
/// - `StructuralInvariantViolation`: 描画・グラフパートのテキストノード数が変化した
/// - `SecurityViolation`: アーカイブの制限に違反した
/// - `Config`: ビルダー設定の検証に失敗した
#[derive(Error, Debug)]
pub enum XlsxlateError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8文字列の変換エラー
    ///
    /// XML属性値などをUTF-8として解釈できなかった場合に発生します。
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// パッケージ（ZIPアーカイブ）として読み込めないエラー
    ///
    /// 入力が圧縮アーカイブでない、または破損している場合に発生します。
    #[error("Malformed package: {0}")]
    MalformedPackage(String),

    /// パートのXML解析エラー
    ///
    /// 書き換え対象のパート（例: `xl/workbook.xml`）が不正なXMLの場合に発生します。
    #[error("Malformed part '{part}': {message}")]
    MalformedPart {
        /// パートのパス
        part: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 構造的不変条件の違反
    ///
    /// 描画・グラフパートで、書き換え前後のテキストランの数が一致しない場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust
    /// use xlsxlate::XlsxlateError;
    ///
    /// let error = XlsxlateError::StructuralInvariantViolation {
    ///     part: "xl/charts/chart1.xml".to_string(),
    ///     before: 3,
    ///     after: 2,
    /// };
    /// assert!(error.to_string().contains("3 -> 2"));
    /// ```
    #[error("Structural invariant violated in '{part}': text run count changed ({before} -> {after})")]
    StructuralInvariantViolation {
        /// パートのパス
        part: String,
        /// 書き換え前のノード数
        before: usize,
        /// 書き換え後のノード数
        after: usize,
    },

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `WorkbookTranslatorBuilder::build()`時に設定を検証し、
    /// 無効な設定が検出された場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),
}

impl XlsxlateError {
    /// パートのXMLエラーを生成するヘルパー
    pub(crate) fn malformed_part(part: &str, message: impl std::fmt::Display) -> Self {
        XlsxlateError::MalformedPart {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

/// 1ファイルの処理が致命的なエラーで中断されたことを表す
///
/// 中断までに記録されたログエントリを保持します。
/// 部分的な結果をどう扱うかは呼び出し側が決定します。
#[derive(Error, Debug)]
#[error("{error}")]
pub struct ProcessingFailure {
    /// 中断の原因
    #[source]
    pub error: XlsxlateError,
    /// 中断までに記録されたログ
    pub log: Vec<TranslationLogEntry>,
}
