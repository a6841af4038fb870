//! Comments Strategy
//!
//! コメントパート（`xl/comments*.xml`）の各`<comment>`のテキストランを選択する戦略。
//! objectIdは`comment:<セル参照>:<ラン番号>`です。ラン番号はコメント内で0から数えます。

use quick_xml::events::Event;

use crate::error::XlsxlateError;
use crate::parts::collect_text_runs;
use crate::xml::{attribute_value, local_name, NodeSelector, SelectedNode, XmlDocument};

/// コメントのセレクタ
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CommentSelector;

impl NodeSelector for CommentSelector {
    fn select(&self, doc: &XmlDocument) -> Result<Vec<SelectedNode>, XlsxlateError> {
        let events = doc.events();
        let mut nodes = Vec::new();

        let mut i = 0;
        while i < events.len() {
            if let Event::Start(e) = &events[i] {
                if local_name(e.name().as_ref()) == b"comment" {
                    let close = doc.closing_index(i).ok_or_else(|| {
                        XlsxlateError::malformed_part(doc.part(), "unclosed comment element")
                    })?;
                    let cell_ref = attribute_value(doc.part(), e, b"ref")?.unwrap_or_default();

                    for (run_index, run) in collect_text_runs(doc, i, close).into_iter().enumerate() {
                        let object_id = format!("comment:{}:{}", cell_ref, run_index);
                        nodes.push(SelectedNode::new(run, object_id).space_sensitive());
                    }

                    i = close + 1;
                    continue;
                }
            }
            i += 1;
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_runs_per_comment() {
        let xml = r#"<comments xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<authors><author>Reviewer</author></authors>
<commentList>
<comment ref="A1" authorId="0"><text><t>Review this</t></text></comment>
<comment ref="C4" authorId="0"><text><r><rPr><b/></rPr><t>Reviewer:</t></r><r><t xml:space="preserve">
Check totals</t></r></text></comment>
</commentList>
</comments>"#;
        let doc = XmlDocument::parse("xl/comments1.xml", xml.as_bytes()).unwrap();
        let selected: Vec<(String, String)> = CommentSelector
            .select(&doc)
            .unwrap()
            .into_iter()
            .map(|n| (n.object_id, doc.text(n.node).unwrap()))
            .collect();

        assert_eq!(
            selected,
            vec![
                ("comment:A1:0".to_string(), "Review this".to_string()),
                ("comment:C4:0".to_string(), "Reviewer:".to_string()),
                ("comment:C4:1".to_string(), "\nCheck totals".to_string()),
            ]
        );
    }
}
