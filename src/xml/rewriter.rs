//! Generic XML Text Rewriter
//!
//! セレクタが選んだテキストノードを翻訳エンジンで置き換える汎用の書き換え処理。
//!
//! - ノードは文書順に処理され、1ノードの翻訳失敗は他のノードに影響しません
//! - 空白のみのノードは翻訳せず、ログも作りません
//! - 置き換えがなかったパートは元のバイト列のまま残ります

use crate::error::XlsxlateError;
use crate::log::NodeOutcome;
use crate::translator::Translator;
use crate::xml::document::{TextNode, XmlDocument};

/// セレクタが返す翻訳候補のノード
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectedNode {
    pub node: TextNode,
    pub object_id: String,
    /// 前後の空白を保持するために`xml:space="preserve"`が必要な要素か
    pub space_sensitive: bool,
}

impl SelectedNode {
    pub fn new(node: TextNode, object_id: String) -> Self {
        Self {
            node,
            object_id,
            space_sensitive: false,
        }
    }

    pub fn space_sensitive(mut self) -> Self {
        self.space_sensitive = true;
        self
    }
}

/// 翻訳対象ノードの選択規則
///
/// 文書順に並んだノードを返す必要があります。
pub(crate) trait NodeSelector {
    fn select(&self, doc: &XmlDocument) -> Result<Vec<SelectedNode>, XlsxlateError>;

    /// 書き換え前後で選択ノード数が一致することを検証するか
    fn guards_node_count(&self) -> bool {
        false
    }
}

/// 1パートの書き換え結果
#[derive(Debug, Clone)]
pub(crate) struct RewriteOutput {
    /// 書き換え後のバイト列（変更がなければ`None`）
    pub payload: Option<Vec<u8>>,
    /// 翻訳を試みたノードの結果（文書順）
    pub outcomes: Vec<NodeOutcome>,
}

/// パートのXMLを書き換える
///
/// # 戻り値
///
/// * `Ok(RewriteOutput)` - 書き換えに成功した場合（ノード単位の失敗を含む）
/// * `Err(XlsxlateError::MalformedPart)` - XMLが解析できない場合
/// * `Err(XlsxlateError::StructuralInvariantViolation)` - ノード数が変化した場合
pub(crate) fn rewrite_part(
    part: &str,
    bytes: &[u8],
    selector: &dyn NodeSelector,
    translator: &dyn Translator,
) -> Result<RewriteOutput, XlsxlateError> {
    let mut doc = XmlDocument::parse(part, bytes)?;
    let nodes = selector.select(&doc)?;

    let mut outcomes = Vec::new();
    let mut changed = false;

    for selected in &nodes {
        let original = doc.text(selected.node)?;
        if original.trim().is_empty() {
            continue;
        }

        match translator.translate(&original, &selected.object_id) {
            Ok(translation) => {
                if translation.text != original {
                    doc.set_text(selected.node, &translation.text);
                    if selected.space_sensitive && has_outer_whitespace(&translation.text) {
                        doc.set_attribute(selected.node.open, "xml:space", "preserve")?;
                    }
                    changed = true;
                }
                outcomes.push(NodeOutcome::ok(
                    selected.object_id.clone(),
                    original,
                    translation.text,
                    translation.engine,
                ));
            }
            Err(e) => {
                tracing::warn!("translation failed for {} in {}: {}", selected.object_id, part, e);
                outcomes.push(NodeOutcome::error(
                    selected.object_id.clone(),
                    original,
                    e.message().to_string(),
                ));
            }
        }
    }

    if !changed {
        return Ok(RewriteOutput {
            payload: None,
            outcomes,
        });
    }

    let payload = doc.to_bytes()?;
    if selector.guards_node_count() {
        verify_node_count(part, nodes.len(), &payload, selector)?;
    }

    tracing::debug!("rewrote {} ({} nodes attempted)", part, outcomes.len());

    Ok(RewriteOutput {
        payload: Some(payload),
        outcomes,
    })
}

/// 書き換え後のパートを再解析し、選択ノード数が変わっていないことを確認する
pub(crate) fn verify_node_count(
    part: &str,
    before: usize,
    payload: &[u8],
    selector: &dyn NodeSelector,
) -> Result<(), XlsxlateError> {
    let after = selector.select(&XmlDocument::parse(part, payload)?)?.len();
    if before != after {
        return Err(XlsxlateError::StructuralInvariantViolation {
            part: part.to_string(),
            before,
            after,
        });
    }
    Ok(())
}

fn has_outer_whitespace(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::{TranslateError, Translation};
    use quick_xml::events::Event;

    /// ローカル名が`t`の要素を文書順に選ぶテスト用セレクタ
    struct AllT {
        guarded: bool,
    }

    impl NodeSelector for AllT {
        fn select(&self, doc: &XmlDocument) -> Result<Vec<SelectedNode>, XlsxlateError> {
            let mut nodes = Vec::new();
            for (i, event) in doc.events().iter().enumerate() {
                if let Event::Start(e) = event {
                    if e.local_name().as_ref() == b"t" {
                        if let Some(close) = doc.closing_index(i) {
                            let id = format!("t:{}", nodes.len());
                            nodes.push(SelectedNode::new(TextNode { open: i, close }, id).space_sensitive());
                        }
                    }
                }
            }
            Ok(nodes)
        }

        fn guards_node_count(&self) -> bool {
            self.guarded
        }
    }

    fn bracket(text: &str, _: &str) -> Result<Translation, TranslateError> {
        Ok(Translation::new(format!("T[{}]", text), "fake"))
    }

    #[test]
    fn test_rewrites_in_document_order() {
        let xml = "<r><t>One</t><n>1</n><t>Two</t></r>";
        let out = rewrite_part("p.xml", xml.as_bytes(), &AllT { guarded: true }, &bracket).unwrap();

        assert_eq!(
            String::from_utf8(out.payload.unwrap()).unwrap(),
            "<r><t>T[One]</t><n>1</n><t>T[Two]</t></r>"
        );
        let ids: Vec<&str> = out.outcomes.iter().map(|o| o.object_id.as_str()).collect();
        assert_eq!(ids, vec!["t:0", "t:1"]);
        assert!(out.outcomes.iter().all(|o| o.is_ok()));
    }

    #[test]
    fn test_whitespace_nodes_are_skipped_but_indexed() {
        let xml = "<r><t>  </t><t></t><t>Three</t></r>";
        let out = rewrite_part("p.xml", xml.as_bytes(), &AllT { guarded: false }, &bracket).unwrap();

        assert_eq!(out.outcomes.len(), 1);
        assert_eq!(out.outcomes[0].object_id, "t:2");
        assert_eq!(
            String::from_utf8(out.payload.unwrap()).unwrap(),
            "<r><t>  </t><t></t><t>T[Three]</t></r>"
        );
    }

    #[test]
    fn test_failure_is_isolated_to_one_node() {
        let flaky = |text: &str, object_id: &str| -> Result<Translation, TranslateError> {
            if object_id == "t:1" {
                Err(TranslateError::new("engine unavailable"))
            } else {
                Ok(Translation::new(format!("T[{}]", text), "fake"))
            }
        };
        let xml = "<r><t>A</t><t>B</t><t>C</t></r>";
        let out = rewrite_part("p.xml", xml.as_bytes(), &AllT { guarded: false }, &flaky).unwrap();

        assert_eq!(
            String::from_utf8(out.payload.unwrap()).unwrap(),
            "<r><t>T[A]</t><t>B</t><t>T[C]</t></r>"
        );
        assert!(out.outcomes[0].is_ok());
        assert!(!out.outcomes[1].is_ok());
        assert_eq!(out.outcomes[1].translated_text, "B");
        assert_eq!(out.outcomes[1].error_message.as_deref(), Some("engine unavailable"));
        assert!(out.outcomes[2].is_ok());
    }

    #[test]
    fn test_unchanged_part_has_no_payload() {
        let identity = |text: &str, _: &str| -> Result<Translation, TranslateError> {
            Ok(Translation::new(text, "identity"))
        };
        let xml = "<r><t>Same</t></r>";
        let out = rewrite_part("p.xml", xml.as_bytes(), &AllT { guarded: true }, &identity).unwrap();
        assert!(out.payload.is_none());
        assert_eq!(out.outcomes.len(), 1);
    }

    #[test]
    fn test_adds_preserve_for_outer_whitespace() {
        let pad = |text: &str, _: &str| -> Result<Translation, TranslateError> {
            Ok(Translation::new(format!(" {} ", text), "pad"))
        };
        let xml = "<r><t>x</t></r>";
        let out = rewrite_part("p.xml", xml.as_bytes(), &AllT { guarded: false }, &pad).unwrap();
        assert_eq!(
            String::from_utf8(out.payload.unwrap()).unwrap(),
            r#"<r><t xml:space="preserve"> x </t></r>"#
        );
    }

    #[test]
    fn test_markup_in_translation_is_escaped() {
        let inject = |_: &str, _: &str| -> Result<Translation, TranslateError> {
            Ok(Translation::new("</t><t>extra", "inject"))
        };
        let xml = "<r><t>x</t></r>";
        let out = rewrite_part("p.xml", xml.as_bytes(), &AllT { guarded: true }, &inject).unwrap();
        assert_eq!(
            String::from_utf8(out.payload.unwrap()).unwrap(),
            "<r><t>&lt;/t&gt;&lt;t&gt;extra</t></r>"
        );
    }

    #[test]
    fn test_verify_node_count_detects_drift() {
        let selector = AllT { guarded: true };
        let tampered = b"<r><t>only one</t></r>";
        match verify_node_count("xl/charts/chart1.xml", 2, tampered, &selector) {
            Err(XlsxlateError::StructuralInvariantViolation { part, before, after }) => {
                assert_eq!(part, "xl/charts/chart1.xml");
                assert_eq!(before, 2);
                assert_eq!(after, 1);
            }
            other => panic!("expected structural violation, got {:?}", other),
        }
        assert!(verify_node_count("x.xml", 1, tampered, &selector).is_ok());
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        let result = rewrite_part("p.xml", b"<r><t>x</r>", &AllT { guarded: false }, &bracket);
        assert!(matches!(result, Err(XlsxlateError::MalformedPart { .. })));
    }
}
