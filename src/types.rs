//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use crate::log::TranslationLogEntry;

/// 1ファイルの処理結果
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// 出力ファイル名（例: `report.xlsx` → `report_fr.xlsx`）
    pub output_file_name: String,
    /// 書き換え後のパッケージ
    pub output_bytes: Vec<u8>,
    /// 翻訳ログ（パイプライン順）
    pub log_entries: Vec<TranslationLogEntry>,
    /// 宣言順のシートと新しいシート名
    pub sheets: Vec<SheetDescriptor>,
}

/// ワークブックで宣言されたシート
///
/// シートタイトルの書き換え時に作成され、セルとコメントの書き換えで参照されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDescriptor {
    /// 元のシートタイトル
    pub original_title: String,
    /// `r:id`属性の値
    pub relationship_id: Option<String>,
    /// サニタイズ済みの新しいシート名
    pub safe_title: String,
    /// セルを格納するワークシートパート（解決できなかった場合は`None`）
    pub worksheet_part: Option<String>,
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列を座標に変換（例: "B3" -> (2, 1)）
    ///
    /// `$`による絶対参照も受け付けます。
    pub fn parse_a1(reference: &str) -> Option<Self> {
        let reference = reference.replace('$', "");
        let split = reference.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = reference.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut col: u32 = 0;
        for ch in letters.chars() {
            let value = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
            col = col.checked_mul(26)?.checked_add(value)?;
        }

        let row = digits.parse::<u32>().ok()?.checked_sub(1)?;
        Some(Self::new(row, col - 1))
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        let col_str = Self::col_index_to_letter(self.col);
        format!("{}{}", col_str, u64::from(self.row) + 1)
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    fn col_index_to_letter(mut col: u32) -> String {
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}
