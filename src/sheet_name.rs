//! Sheet Name Sanitizer Module
//!
//! 翻訳後のシートタイトルを、Excelで使用可能かつファイル内で一意なシート名に変換します。

use std::collections::HashSet;

/// シート名の最大文字数
pub(crate) const MAX_SHEET_NAME_CHARS: usize = 31;

/// シート名に使用できない文字
const FORBIDDEN_CHARS: [char; 7] = ['\\', '/', '*', '?', ':', '[', ']'];

/// 空になった場合のフォールバック名
const FALLBACK_NAME: &str = "Sheet";

/// 使用済みシート名の登録簿
///
/// シートは宣言順に処理する必要があります。衝突時の連番は呼び出し順に依存します。
#[derive(Debug, Default, Clone)]
pub(crate) struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 候補名をサニタイズし、一意な名前として登録する
    pub fn claim(&mut self, candidate: &str) -> String {
        let safe = sanitize(candidate, &self.used);
        self.used.insert(safe.clone());
        safe
    }
}

/// 候補タイトルを安全なシート名に変換
///
/// 1. 禁止文字を`_`に置換
/// 2. 前後の空白を除去（空なら`"Sheet"`）
/// 3. 31文字に切り詰め
/// 4. 衝突時は`_1`, `_2`, ...を付与（付与後も31文字以内）
pub(crate) fn sanitize(candidate: &str, already_used: &HashSet<String>) -> String {
    let replaced: String = candidate
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let trimmed = replaced.trim();
    let base = if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        truncate_chars(trimmed, MAX_SHEET_NAME_CHARS)
    };

    if !already_used.contains(&base) {
        return base;
    }

    let mut counter: usize = 1;
    loop {
        let suffix = format!("_{}", counter);
        let keep = MAX_SHEET_NAME_CHARS.saturating_sub(suffix.chars().count());
        let candidate = format!("{}{}", truncate_chars(&base, keep), suffix);
        if !already_used.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_replaces_forbidden_characters() {
        let used = HashSet::new();
        assert_eq!(sanitize("Q1/Q2: [draft]?", &used), "Q1_Q2_ _draft__");
        assert_eq!(sanitize("a\\b*c", &used), "a_b_c");
    }

    #[test]
    fn test_trims_and_falls_back() {
        let used = HashSet::new();
        assert_eq!(sanitize("  Sales  ", &used), "Sales");
        assert_eq!(sanitize("   ", &used), "Sheet");
        assert_eq!(sanitize("", &used), "Sheet");
    }

    #[test]
    fn test_truncates_to_31_chars() {
        let used = HashSet::new();
        let long = "x".repeat(40);
        assert_eq!(sanitize(&long, &used).chars().count(), 31);

        // マルチバイト文字も文字数で数える
        let long_jp = "売上".repeat(20);
        let safe = sanitize(&long_jp, &used);
        assert_eq!(safe.chars().count(), 31);
    }

    #[test]
    fn test_collision_suffixes() {
        let mut registry = SheetNameRegistry::new();
        assert_eq!(registry.claim("Sales"), "Sales");
        assert_eq!(registry.claim("Sales"), "Sales_1");
        assert_eq!(registry.claim("Sales"), "Sales_2");
        // 大文字小文字は区別する
        assert_eq!(registry.claim("sales"), "sales");
    }

    #[test]
    fn test_collision_suffix_fits_in_31_chars() {
        let mut registry = SheetNameRegistry::new();
        let long = "y".repeat(31);
        assert_eq!(registry.claim(&long), long);

        let second = registry.claim(&long);
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with("_1"));
        assert_eq!(&second[..29], &long[..29]);
    }

    #[test]
    fn test_collision_with_fallback_name() {
        let mut registry = SheetNameRegistry::new();
        assert_eq!(registry.claim("Sheet"), "Sheet");
        assert_eq!(registry.claim("???"), "___");
        assert_eq!(registry.claim(" "), "Sheet_1");
    }

    proptest! {
        #[test]
        fn prop_claimed_names_are_legal_and_unique(titles in prop::collection::vec(".{0,48}", 1..12)) {
            let mut registry = SheetNameRegistry::new();
            let mut seen = HashSet::new();
            for title in &titles {
                let safe = registry.claim(title);
                prop_assert!(!safe.is_empty());
                prop_assert!(safe.chars().count() <= MAX_SHEET_NAME_CHARS);
                prop_assert!(!safe.chars().any(|c| FORBIDDEN_CHARS.contains(&c)));
                prop_assert!(seen.insert(safe));
            }
        }

        #[test]
        fn prop_sanitize_is_deterministic(title in ".{0,40}") {
            let used: HashSet<String> = ["Sheet".to_string()].into_iter().collect();
            prop_assert_eq!(sanitize(&title, &used), sanitize(&title, &used));
        }
    }
}
