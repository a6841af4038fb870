//! Extended Properties
//!
//! `docProps/app.xml`の`<TitlesOfParts>`に列挙されたシート名を、
//! サニタイズ後のシートタイトルに合わせて書き換えます。

use quick_xml::events::Event;

use crate::error::XlsxlateError;
use crate::types::SheetDescriptor;
use crate::xml::{local_name, TextNode, XmlDocument};

/// 既定の拡張プロパティパート
pub(crate) const DEFAULT_APP_PROPERTIES_PART: &str = "docProps/app.xml";

/// `<TitlesOfParts>`内のシート名を書き換える
///
/// シート名は宣言順に先頭から並び、名前付き範囲などがその後に続きます。
/// 宣言順に元のタイトルと一致する`<vt:lpstr>`だけを置き換えるため、
/// シート以外の項目は変更されません。
///
/// # 戻り値
///
/// 変更があった場合のみ新しいパートの内容
pub(crate) fn rewrite_titles_of_parts(
    part: &str,
    bytes: &[u8],
    sheets: &[SheetDescriptor],
) -> Result<Option<Vec<u8>>, XlsxlateError> {
    if sheets
        .iter()
        .all(|sheet| sheet.original_title == sheet.safe_title)
    {
        return Ok(None);
    }

    let mut doc = XmlDocument::parse(part, bytes)?;
    let entries = titles_of_parts(&doc);

    let mut pending = sheets.iter().peekable();
    let mut changed = false;
    for entry in entries {
        let sheet = match pending.peek() {
            Some(sheet) => *sheet,
            None => break,
        };
        if doc.text(entry)? != sheet.original_title {
            continue;
        }
        if sheet.safe_title != sheet.original_title {
            doc.set_text(entry, &sheet.safe_title);
            changed = true;
        }
        pending.next();
    }

    if changed {
        Ok(Some(doc.to_bytes()?))
    } else {
        Ok(None)
    }
}

/// `<TitlesOfParts>`直下のベクタにある`<lpstr>`要素を文書順に集める
fn titles_of_parts(doc: &XmlDocument) -> Vec<TextNode> {
    let events = doc.events();
    let mut entries = Vec::new();
    let mut inside = false;

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"TitlesOfParts" => inside = true,
                b"lpstr" if inside => {
                    if let Some(close) = doc.closing_index(i) {
                        entries.push(TextNode { open: i, close });
                    }
                }
                _ => {}
            },
            Event::End(e) if local_name(e.name().as_ref()) == b"TitlesOfParts" => {
                inside = false;
            }
            _ => {}
        }
    }

    entries
}
