//! Part Strategies Module
//!
//! パートの種類ごとの書き換え戦略を提供するモジュール。
//!
//! 各戦略は[`NodeSelector`]として翻訳対象ノードの選び方とobjectIdの付け方を定義し、
//! 書き換えそのものは[`crate::xml::rewrite_part`]が行います。
//! シートタイトルのみ属性の書き換えとなるため、専用の処理を持ちます。

pub(crate) mod app_props;
pub(crate) mod comments;
pub(crate) mod drawing;
pub(crate) mod shared_strings;
pub(crate) mod workbook;
pub(crate) mod worksheet;

use quick_xml::events::Event;

use crate::api::PartKind;
use crate::xml::{local_name, NodeSelector, TextNode, XmlDocument};

pub(crate) use app_props::{rewrite_titles_of_parts, DEFAULT_APP_PROPERTIES_PART};
pub(crate) use comments::CommentSelector;
pub(crate) use drawing::{is_drawing_part, DrawingTextSelector};
pub(crate) use shared_strings::SharedStringSelector;
pub(crate) use workbook::rewrite_sheet_titles;
pub(crate) use worksheet::WorksheetCellSelector;

/// パートの種類に対応するセレクタを生成
///
/// シートタイトルは属性の書き換えのためセレクタを持ちません。
pub(crate) fn selector_for(kind: PartKind, part: &str) -> Option<Box<dyn NodeSelector>> {
    match kind {
        PartKind::SheetTitles => None,
        PartKind::Worksheets => Some(Box::new(WorksheetCellSelector)),
        PartKind::SharedStrings => Some(Box::new(SharedStringSelector)),
        PartKind::Comments => Some(Box::new(CommentSelector)),
        PartKind::Drawings => Some(Box::new(DrawingTextSelector::new(part))),
    }
}

/// `open`から`close`までの範囲にある`<t>`要素（テキストラン）を文書順に集める
///
/// ふりがな（`<rPh>`）内の`<t>`は対象外です。
pub(crate) fn collect_text_runs(doc: &XmlDocument, open: usize, close: usize) -> Vec<TextNode> {
    let events = doc.events();
    let mut runs = Vec::new();
    let mut phonetic_depth = 0usize;
    let mut i = open + 1;

    while i < close {
        match &events[i] {
            Event::Start(e) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if name == b"rPh" {
                    phonetic_depth += 1;
                } else if name == b"t" && phonetic_depth == 0 {
                    if let Some(end) = doc.closing_index(i) {
                        runs.push(TextNode { open: i, close: end });
                        i = end + 1;
                        continue;
                    }
                }
            }
            Event::End(e) => {
                if local_name(e.name().as_ref()) == b"rPh" {
                    phonetic_depth = phonetic_depth.saturating_sub(1);
                }
            }
            Event::Empty(e) => {
                if local_name(e.name().as_ref()) == b"t" && phonetic_depth == 0 {
                    runs.push(TextNode { open: i, close: i });
                }
            }
            _ => {}
        }
        i += 1;
    }

    runs
}

/// 複数ランを持つ項目のみ`:<ラン番号>`を付けたobjectIdを生成
pub(crate) fn run_object_id(base: &str, run_index: usize, run_count: usize) -> String {
    if run_count > 1 {
        format!("{}:{}", base, run_index)
    } else {
        base.to_string()
    }
}

/// ランのテキストを連結した値が数式のように`=`で始まるか
pub(crate) fn starts_like_formula(
    doc: &XmlDocument,
    runs: &[TextNode],
) -> Result<bool, crate::error::XlsxlateError> {
    let mut text = String::new();
    for run in runs {
        text.push_str(&doc.text(*run)?);
    }
    Ok(text.starts_with('='))
}
