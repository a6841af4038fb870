//! Builder Module
//!
//! Fluent Builder APIを提供し、`WorkbookTranslator`インスタンスを段階的に構築する。

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use rayon::prelude::*;

use crate::api::PartKind;
use crate::error::{ProcessingFailure, XlsxlateError};
use crate::orchestrator::{output_file_name, process_file};
use crate::security::SecurityConfig;
use crate::translator::Translator;
use crate::types::ProcessingResult;

/// 翻訳処理の設定を保持する内部構造体
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TranslationConfig {
    /// 翻訳先の言語コード（出力ファイル名に使用）
    pub target_language: String,

    /// 書き換えを行うパートの種類
    pub parts: BTreeSet<PartKind>,

    /// パッケージ読み込み時の制限
    pub security: SecurityConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: String::new(),
            parts: PartKind::ALL.iter().copied().collect(),
            security: SecurityConfig::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `WorkbookTranslator`インスタンスを段階的に構築するためのビルダーです。
/// 翻訳先の言語コードのみ必須で、それ以外の設定にはデフォルト値があります。
///
/// # 使用例
///
/// ```rust
/// use xlsxlate::{PartKind, WorkbookTranslatorBuilder};
///
/// # fn main() -> Result<(), xlsxlate::XlsxlateError> {
/// let translator = WorkbookTranslatorBuilder::new()
///     .with_target_language("ja")
///     .skip_part(PartKind::Drawings)
///     .build()?;
/// assert_eq!(translator.output_file_name("report.xlsx"), "report_ja.xlsx");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct WorkbookTranslatorBuilder {
    /// 内部設定（構築中）
    config: TranslationConfig,
}

impl WorkbookTranslatorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 翻訳先の言語: 未設定（`build()`前に指定が必要）
    /// - 対象パート: すべて（シートタイトル、セル、共有文字列、コメント、描画・グラフ）
    /// - セキュリティ設定: [`SecurityConfig::default()`]
    pub fn new() -> Self {
        Self::default()
    }

    /// 翻訳先の言語コードを指定する
    ///
    /// 出力ファイル名は`<元のファイル名>_<言語コード>.<拡張子>`になります。
    pub fn with_target_language(mut self, code: impl Into<String>) -> Self {
        self.config.target_language = code.into();
        self
    }

    /// 書き換えを行うパートの種類を指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxlate::{PartKind, WorkbookTranslatorBuilder};
    ///
    /// // シートタイトルとセルのみ翻訳する
    /// let builder = WorkbookTranslatorBuilder::new()
    ///     .with_target_language("de")
    ///     .with_parts(&[PartKind::SheetTitles, PartKind::Worksheets, PartKind::SharedStrings]);
    /// ```
    pub fn with_parts(mut self, parts: &[PartKind]) -> Self {
        self.config.parts = parts.iter().copied().collect();
        self
    }

    /// 指定したパートの種類を書き換え対象から外す
    pub fn skip_part(mut self, part: PartKind) -> Self {
        self.config.parts.remove(&part);
        self
    }

    /// パッケージ読み込み時のセキュリティ設定を指定する
    pub fn with_security_config(mut self, config: SecurityConfig) -> Self {
        self.config.security = config;
        self
    }

    /// 設定を検証し、`WorkbookTranslator`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookTranslator)`: 設定が有効な場合
    /// * `Err(XlsxlateError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * 言語コードが空、または空白やパス区切り文字を含む
    /// * 対象パートが1つもない
    /// * セキュリティ設定の制限値が0
    pub fn build(self) -> Result<WorkbookTranslator, XlsxlateError> {
        // 1. 言語コードの検証
        let code = &self.config.target_language;
        if code.is_empty() {
            return Err(XlsxlateError::Config(
                "target language must be set".to_string(),
            ));
        }
        if code
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\')
        {
            return Err(XlsxlateError::Config(format!(
                "Invalid target language code: '{}'",
                code
            )));
        }

        // 2. 対象パートの検証
        if self.config.parts.is_empty() {
            return Err(XlsxlateError::Config(
                "at least one part kind must be enabled".to_string(),
            ));
        }

        // 3. セキュリティ設定の検証
        self.config.security.validate()?;

        Ok(WorkbookTranslator {
            config: self.config,
        })
    }
}

/// 翻訳処理のファサード
///
/// XLSXパッケージ内のテキストを翻訳し、構造を保ったまま書き戻すためのメインエントリーポイントです。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxlate::{IdentityTranslator, WorkbookTranslatorBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let translator = WorkbookTranslatorBuilder::new()
///     .with_target_language("fr")
///     .build()?;
/// let result = translator.translate_file("report.xlsx", &IdentityTranslator)?;
/// std::fs::write(&result.output_file_name, &result.output_bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WorkbookTranslator {
    /// 翻訳設定
    config: TranslationConfig,
}

impl WorkbookTranslator {
    /// メモリ上のパッケージを翻訳
    ///
    /// # 引数
    ///
    /// * `file_name` - 入力ファイル名（ログと出力ファイル名に使用）
    /// * `bytes` - XLSXパッケージの内容
    /// * `translator` - 翻訳エンジン
    ///
    /// # 戻り値
    ///
    /// * `Ok(ProcessingResult)` - 出力パッケージとログ（ノード単位の失敗はログに含まれる）
    /// * `Err(ProcessingFailure)` - 致命的なエラーと、それまでのログ
    pub fn translate<T: Translator>(
        &self,
        file_name: &str,
        bytes: &[u8],
        translator: &T,
    ) -> Result<ProcessingResult, ProcessingFailure> {
        process_file(file_name, bytes, &self.config, translator)
    }

    /// リーダーから読み込んだパッケージを翻訳
    pub fn translate_reader<R: Read, T: Translator>(
        &self,
        file_name: &str,
        mut input: R,
        translator: &T,
    ) -> Result<ProcessingResult, ProcessingFailure> {
        let mut buffer = Vec::new();
        input
            .read_to_end(&mut buffer)
            .map_err(|e| ProcessingFailure {
                error: XlsxlateError::Io(e),
                log: Vec::new(),
            })?;
        self.translate(file_name, &buffer, translator)
    }

    /// ファイルを翻訳
    ///
    /// ログと出力ファイル名にはパスのファイル名部分を使用します。
    pub fn translate_file<P: AsRef<Path>, T: Translator>(
        &self,
        path: P,
        translator: &T,
    ) -> Result<ProcessingResult, ProcessingFailure> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path).map_err(|e| ProcessingFailure {
            error: XlsxlateError::Io(e),
            log: Vec::new(),
        })?;
        self.translate(&file_name, &bytes, translator)
    }

    /// 複数のファイルを並列に翻訳
    ///
    /// 各ファイルは独立したパッケージとログを持ち、1ファイルの失敗は他のファイルに影響しません。
    /// 結果は入力と同じ順序で返されます。
    ///
    /// # 引数
    ///
    /// * `inputs` - (ファイル名, パッケージの内容) の組
    pub fn translate_batch<T: Translator + Sync>(
        &self,
        inputs: &[(String, Vec<u8>)],
        translator: &T,
    ) -> Vec<Result<ProcessingResult, ProcessingFailure>> {
        inputs
            .par_iter()
            .map(|(file_name, bytes)| self.translate(file_name, bytes, translator))
            .collect()
    }

    /// 出力ファイル名を生成
    pub fn output_file_name(&self, file_name: &str) -> String {
        output_file_name(file_name, &self.config.target_language)
    }

    /// 翻訳先の言語コード
    pub fn target_language(&self) -> &str {
        &self.config.target_language
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &TranslationConfig {
        &self.config
    }
}
