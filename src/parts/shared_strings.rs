//! Shared Strings Strategy
//!
//! 共有文字列テーブル（`<sst>`）の各項目（`<si>`）のテキストランを選択する戦略。
//! 項目のインデックスはセルから参照される番号と一致します。

use quick_xml::events::Event;

use crate::error::XlsxlateError;
use crate::parts::{collect_text_runs, run_object_id, starts_like_formula};
use crate::xml::{local_name, NodeSelector, SelectedNode, TextNode, XmlDocument};

/// 共有文字列のセレクタ
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SharedStringSelector;

impl NodeSelector for SharedStringSelector {
    fn select(&self, doc: &XmlDocument) -> Result<Vec<SelectedNode>, XlsxlateError> {
        let events = doc.events();
        let mut nodes = Vec::new();
        let mut index = 0usize;

        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::Start(e) if local_name(e.name().as_ref()) == b"si" => {
                    let close = doc.closing_index(i).ok_or_else(|| {
                        XlsxlateError::malformed_part(doc.part(), "unclosed shared string item")
                    })?;
                    select_item(doc, index, i, close, &mut nodes)?;
                    index += 1;
                    i = close + 1;
                    continue;
                }
                // 空の項目もインデックスを消費する
                Event::Empty(e) if local_name(e.name().as_ref()) == b"si" => index += 1,
                _ => {}
            }
            i += 1;
        }

        Ok(nodes)
    }
}

fn select_item(
    doc: &XmlDocument,
    index: usize,
    open: usize,
    close: usize,
    nodes: &mut Vec<SelectedNode>,
) -> Result<(), XlsxlateError> {
    let runs: Vec<TextNode> = collect_text_runs(doc, open, close);
    // 数式のような文字列はセルと同様に扱う
    if runs.is_empty() || starts_like_formula(doc, &runs)? {
        return Ok(());
    }

    let base = format!("sharedString:{}", index);
    let count = runs.len();
    for (run_index, run) in runs.into_iter().enumerate() {
        nodes.push(SelectedNode::new(run, run_object_id(&base, run_index, count)).space_sensitive());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_items_by_index() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="5">
<si><t>Hello</t></si>
<si/>
<si><t>=NOT_A_FORMULA</t></si>
<si><r><t>Rich</t></r><r><rPr><i/></rPr><t>Text</t></r><rPh><t>りっち</t></rPh></si>
<si><t>  </t></si>
</sst>"#;
        let doc = XmlDocument::parse("xl/sharedStrings.xml", xml.as_bytes()).unwrap();
        let selected: Vec<(String, String)> = SharedStringSelector
            .select(&doc)
            .unwrap()
            .into_iter()
            .map(|n| (n.object_id, doc.text(n.node).unwrap()))
            .collect();

        assert_eq!(
            selected,
            vec![
                ("sharedString:0".to_string(), "Hello".to_string()),
                ("sharedString:3:0".to_string(), "Rich".to_string()),
                ("sharedString:3:1".to_string(), "Text".to_string()),
                ("sharedString:4".to_string(), "  ".to_string()),
            ]
        );
    }
}
