//! Security Module
//!
//! パッケージ読み込み時のセキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃への対策を提供します。

use crate::error::XlsxlateError;

/// セキュリティ設定
///
/// パッケージ読み込み時のアーカイブ制限を定義します。
///
/// # 使用例
///
/// ```rust
/// use xlsxlate::{SecurityConfig, WorkbookTranslatorBuilder};
///
/// # fn main() -> Result<(), xlsxlate::XlsxlateError> {
/// let limits = SecurityConfig {
///     max_file_count: 500,
///     ..SecurityConfig::default()
/// };
/// let translator = WorkbookTranslatorBuilder::new()
///     .with_target_language("fr")
///     .with_security_config(limits)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,         // 100MB
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

impl SecurityConfig {
    /// 設定値の妥当性を検証
    pub(crate) fn validate(&self) -> Result<(), XlsxlateError> {
        if self.max_file_count == 0 {
            return Err(XlsxlateError::Config(
                "max_file_count must be greater than 0".to_string(),
            ));
        }
        if self.max_file_size == 0 || self.max_decompressed_size == 0 {
            return Err(XlsxlateError::Config(
                "size limits must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 入力サイズの上限チェック
    pub(crate) fn check_input_size(&self, len: usize) -> Result<(), XlsxlateError> {
        if len as u64 > self.max_input_file_size {
            return Err(XlsxlateError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// エントリ数の上限チェック
    pub(crate) fn check_file_count(&self, count: usize) -> Result<(), XlsxlateError> {
        if count > self.max_file_count {
            return Err(XlsxlateError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                count, self.max_file_count
            )));
        }
        Ok(())
    }

    /// エントリサイズの上限チェック（累計を更新する）
    pub(crate) fn check_entry_size(
        &self,
        name: &str,
        size: u64,
        total: &mut u64,
    ) -> Result<(), XlsxlateError> {
        if size > self.max_file_size {
            return Err(XlsxlateError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, self.max_file_size
            )));
        }

        *total = total.checked_add(size).ok_or_else(|| {
            XlsxlateError::SecurityViolation(
                "Total decompressed size calculation overflow".to_string(),
            )
        })?;

        if *total > self.max_decompressed_size {
            return Err(XlsxlateError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total, self.max_decompressed_size
            )));
        }
        Ok(())
    }
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、アーカイブ内のエントリ名を検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // Windows形式の`C:\`やUnix形式の`/`で始まるパス
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
