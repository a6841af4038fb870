//! Drawing and Chart Strategy
//!
//! 描画パート（図形、テキストボックス）とグラフパート（タイトル、軸ラベル）の
//! DrawingMLテキストラン（`<a:t>`）を選択する戦略。
//!
//! グラフの数値キャッシュ（`<c:v>`）や数式参照（`<c:f>`）は別の名前空間の要素のため、
//! 選択されることはありません。

use quick_xml::events::Event;

use crate::error::XlsxlateError;
use crate::xml::{local_name, NamespaceScopes, NodeSelector, SelectedNode, TextNode, XmlDocument};

/// DrawingMLの名前空間
pub(crate) const DRAWINGML_NS: &[u8] = b"http://schemas.openxmlformats.org/drawingml/2006/main";

/// 描画・グラフパートかどうか
pub(crate) fn is_drawing_part(part: &str) -> bool {
    (part.starts_with("xl/drawings/") || part.starts_with("xl/charts/"))
        && part.ends_with(".xml")
        && !part.contains("/_rels/")
}

/// DrawingMLテキストランのセレクタ
///
/// インデックスは空のランも含めて文書順に振られます。
#[derive(Debug, Clone)]
pub(crate) struct DrawingTextSelector {
    part: String,
}

impl DrawingTextSelector {
    pub fn new(part: &str) -> Self {
        Self {
            part: part.to_string(),
        }
    }
}

impl NodeSelector for DrawingTextSelector {
    fn select(&self, doc: &XmlDocument) -> Result<Vec<SelectedNode>, XlsxlateError> {
        let mut scopes = NamespaceScopes::default();
        let mut nodes = Vec::new();

        for (i, event) in doc.events().iter().enumerate() {
            match event {
                Event::Start(e) => {
                    scopes.push(e);
                    if self.is_text_run(&scopes, e.name().as_ref()) {
                        let close = doc.closing_index(i).ok_or_else(|| {
                            XlsxlateError::malformed_part(doc.part(), "unclosed text run")
                        })?;
                        nodes.push(self.node(TextNode { open: i, close }, nodes.len()));
                    }
                }
                Event::Empty(e) => {
                    scopes.push(e);
                    if self.is_text_run(&scopes, e.name().as_ref()) {
                        nodes.push(self.node(TextNode { open: i, close: i }, nodes.len()));
                    }
                    scopes.pop();
                }
                Event::End(_) => scopes.pop(),
                _ => {}
            }
        }

        Ok(nodes)
    }

    fn guards_node_count(&self) -> bool {
        true
    }
}

impl DrawingTextSelector {
    fn is_text_run(&self, scopes: &NamespaceScopes, qname: &[u8]) -> bool {
        local_name(qname) == b"t" && scopes.resolve_element(qname) == Some(DRAWINGML_NS)
    }

    fn node(&self, node: TextNode, index: usize) -> SelectedNode {
        SelectedNode::new(node, format!("{}:{}", self.part, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
<c:chart><c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Quarterly Revenue</a:t></a:r></a:p></c:rich></c:tx></c:title>
<c:plotArea><c:barChart><c:ser><c:val><c:numRef><c:f>Sales!$B$2:$B$5</c:f>
<c:numCache><c:pt idx="0"><c:v>10</c:v></c:pt></c:numCache></c:numRef></c:val></c:ser></c:barChart>
<c:catAx><c:title><c:tx><c:rich><a:p><a:r><a:t/></a:r><a:r><a:t>Quarter</a:t></a:r></a:p></c:rich></c:tx></c:title></c:catAx>
</c:plotArea></c:chart></c:chartSpace>"#;

    #[test]
    fn test_selects_drawingml_text_runs_only() {
        let part = "xl/charts/chart1.xml";
        let doc = XmlDocument::parse(part, CHART.as_bytes()).unwrap();
        let selected: Vec<(String, String)> = DrawingTextSelector::new(part)
            .select(&doc)
            .unwrap()
            .into_iter()
            .map(|n| (n.object_id, doc.text(n.node).unwrap()))
            .collect();

        assert_eq!(
            selected,
            vec![
                ("xl/charts/chart1.xml:0".to_string(), "Quarterly Revenue".to_string()),
                ("xl/charts/chart1.xml:1".to_string(), String::new()),
                ("xl/charts/chart1.xml:2".to_string(), "Quarter".to_string()),
            ]
        );
    }

    #[test]
    fn test_other_namespaces_are_ignored() {
        let xml = r#"<root xmlns:a="urn:not-drawingml"><a:t>skip</a:t><t>skip</t></root>"#;
        let doc = XmlDocument::parse("xl/drawings/drawing1.xml", xml.as_bytes()).unwrap();
        let selected = DrawingTextSelector::new("xl/drawings/drawing1.xml")
            .select(&doc)
            .unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_is_drawing_part() {
        assert!(is_drawing_part("xl/drawings/drawing1.xml"));
        assert!(is_drawing_part("xl/charts/chart2.xml"));
        assert!(!is_drawing_part("xl/drawings/_rels/drawing1.xml.rels"));
        assert!(!is_drawing_part("xl/drawings/vmlDrawing1.vml"));
        assert!(!is_drawing_part("xl/worksheets/sheet1.xml"));
    }
}
