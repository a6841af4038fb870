//! Worksheet Cell Strategy
//!
//! ワークシートパートのセルテキストを選択する戦略。
//!
//! - インライン文字列（`t="inlineStr"`）: `<is>`内のテキストラン
//! - 文字列型セル（`t="str"`）: `<v>`のキャッシュ値
//! - 共有文字列型セル（`t="s"`）は共有文字列テーブル側で翻訳されるため対象外
//!
//! 数式（`<f>`）を持つセルと、値が`=`で始まるセルは翻訳も記録もしません。

use quick_xml::events::{BytesStart, Event};

use crate::error::XlsxlateError;
use crate::parts::{collect_text_runs, run_object_id, starts_like_formula};
use crate::types::CellCoord;
use crate::xml::{attribute_value, local_name, NodeSelector, SelectedNode, TextNode, XmlDocument};

/// ワークシートのセルテキストのセレクタ
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WorksheetCellSelector;

impl NodeSelector for WorksheetCellSelector {
    fn select(&self, doc: &XmlDocument) -> Result<Vec<SelectedNode>, XlsxlateError> {
        let events = doc.events();
        let mut nodes = Vec::new();

        // 現在の行（0始まり）と直前のセル座標
        let mut row: Option<u32> = None;
        let mut previous: Option<CellCoord> = None;

        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"row" => {
                    let next_row = match attribute_value(doc.part(), e, b"r")? {
                        Some(r) => r.trim().parse::<u32>().ok().and_then(|r| r.checked_sub(1)),
                        None => None,
                    };
                    row = Some(match (next_row, row) {
                        (Some(r), _) => r,
                        (None, None) => 0,
                        (None, Some(r)) => r.checked_add(1).ok_or_else(|| {
                            XlsxlateError::malformed_part(doc.part(), "row index out of range")
                        })?,
                    });
                    previous = None;
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"c" => {
                    previous = Some(cell_coord(doc, e, row, previous)?);
                }
                Event::Start(e) if local_name(e.name().as_ref()) == b"c" => {
                    let coord = cell_coord(doc, e, row, previous)?;
                    previous = Some(coord);

                    let close = doc.closing_index(i).ok_or_else(|| {
                        XlsxlateError::malformed_part(doc.part(), "unclosed cell element")
                    })?;
                    let cell_type = attribute_value(doc.part(), e, b"t")?;
                    select_cell(doc, i, close, cell_type.as_deref(), coord, &mut nodes)?;

                    i = close + 1;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        Ok(nodes)
    }
}

/// セル座標を`r`属性から取得し、無ければ行と直前のセルから推定する
fn cell_coord(
    doc: &XmlDocument,
    cell: &BytesStart<'_>,
    row: Option<u32>,
    previous: Option<CellCoord>,
) -> Result<CellCoord, XlsxlateError> {
    if let Some(reference) = attribute_value(doc.part(), cell, b"r")? {
        if let Some(coord) = CellCoord::parse_a1(&reference) {
            return Ok(coord);
        }
    }
    let row = row.unwrap_or(0);
    let col = match previous {
        Some(p) => p.col.checked_add(1).ok_or_else(|| {
            XlsxlateError::malformed_part(doc.part(), "column index out of range")
        })?,
        None => 0,
    };
    Ok(CellCoord::new(row, col))
}

fn select_cell(
    doc: &XmlDocument,
    open: usize,
    close: usize,
    cell_type: Option<&str>,
    coord: CellCoord,
    nodes: &mut Vec<SelectedNode>,
) -> Result<(), XlsxlateError> {
    let events = doc.events();
    let has_formula = events[open + 1..close].iter().any(|event| match event {
        Event::Start(e) | Event::Empty(e) => local_name(e.name().as_ref()) == b"f",
        _ => false,
    });
    if has_formula {
        return Ok(());
    }

    let base = format!("cell:{}", coord.to_a1_notation());
    let runs = match cell_type {
        Some("inlineStr") => match child_element(doc, open, close, b"is") {
            Some(is) => collect_text_runs(doc, is.open, is.close),
            None => Vec::new(),
        },
        Some("str") => child_element(doc, open, close, b"v").into_iter().collect(),
        _ => Vec::new(),
    };

    if runs.is_empty() || starts_like_formula(doc, &runs)? {
        return Ok(());
    }

    let count = runs.len();
    for (index, run) in runs.into_iter().enumerate() {
        let selected = SelectedNode::new(run, run_object_id(&base, index, count));
        // `<v>`には`xml:space`を付けない
        nodes.push(if cell_type == Some("inlineStr") {
            selected.space_sensitive()
        } else {
            selected
        });
    }
    Ok(())
}

/// セル直下の子要素を探す
fn child_element(doc: &XmlDocument, open: usize, close: usize, name: &[u8]) -> Option<TextNode> {
    let events = doc.events();
    let mut depth = 0usize;
    for i in open + 1..close {
        match &events[i] {
            Event::Start(e) => {
                if depth == 0 && local_name(e.name().as_ref()) == name {
                    let end = doc.closing_index(i)?;
                    return Some(TextNode { open: i, close: end });
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(xml: &str) -> Vec<(String, String)> {
        let doc = XmlDocument::parse("xl/worksheets/sheet1.xml", xml.as_bytes()).unwrap();
        WorksheetCellSelector
            .select(&doc)
            .unwrap()
            .into_iter()
            .map(|n| (n.object_id, doc.text(n.node).unwrap()))
            .collect()
    }

    #[test]
    fn test_selects_inline_and_str_cells() {
        let xml = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Hello</t></is></c><c r="B1"><v>42</v></c><c r="C1" t="s"><v>0</v></c></row>
<row r="2"><c r="A2" t="str"><v>Cached</v></c></row>
</sheetData></worksheet>"#;
        assert_eq!(
            select(xml),
            vec![
                ("cell:A1".to_string(), "Hello".to_string()),
                ("cell:A2".to_string(), "Cached".to_string()),
            ]
        );
    }

    #[test]
    fn test_skips_formula_cells() {
        let xml = r#"<worksheet><sheetData><row r="2">
<c r="A2" t="str"><f>A1&amp;"x"</f><v>Hellox</v></c>
<c r="B2" t="inlineStr"><is><t>=A2+B2</t></is></c>
<c r="C2" t="str"><v>=SUM(1)</v></c>
<c r="D2" t="inlineStr"><is><t>Plain</t></is></c>
</row></sheetData></worksheet>"#;
        assert_eq!(select(xml), vec![("cell:D2".to_string(), "Plain".to_string())]);
    }

    #[test]
    fn test_rich_inline_runs_get_run_suffix() {
        let xml = r#"<worksheet><sheetData><row r="3">
<c r="B3" t="inlineStr"><is><r><rPr><b/></rPr><t>Bold</t></r><r><t xml:space="preserve"> tail</t></r></is></c>
</row></sheetData></worksheet>"#;
        assert_eq!(
            select(xml),
            vec![
                ("cell:B3:0".to_string(), "Bold".to_string()),
                ("cell:B3:1".to_string(), " tail".to_string()),
            ]
        );
    }

    #[test]
    fn test_last_row_index_does_not_overflow() {
        let xml = r#"<worksheet><sheetData>
<row r="4294967295"/>
<row><c t="inlineStr"><is><t>Edge</t></is></c></row>
</sheetData></worksheet>"#;
        assert_eq!(
            select(xml),
            vec![("cell:A4294967296".to_string(), "Edge".to_string())]
        );

        let beyond = r#"<worksheet><sheetData>
<row r="4294967295"/><row/><row><c t="inlineStr"><is><t>Edge</t></is></c></row>
</sheetData></worksheet>"#;
        let doc = XmlDocument::parse("xl/worksheets/sheet1.xml", beyond.as_bytes()).unwrap();
        let err = WorksheetCellSelector.select(&doc).unwrap_err();
        assert!(matches!(err, XlsxlateError::MalformedPart { .. }));
    }

    #[test]
    fn test_infers_missing_coordinates() {
        let xml = r#"<worksheet><sheetData>
<row r="4"><c r="B4"/><c t="inlineStr"><is><t>C</t></is></c></row>
<row><c t="inlineStr"><is><t>A</t></is></c></row>
</sheetData></worksheet>"#;
        assert_eq!(
            select(xml),
            vec![
                ("cell:C4".to_string(), "C".to_string()),
                ("cell:A5".to_string(), "A".to_string()),
            ]
        );
    }
}
