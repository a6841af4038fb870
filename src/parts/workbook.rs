//! Workbook Sheet Title Strategy
//!
//! ワークブックパートの`<sheet name="..." r:id="...">`宣言を読み取り、
//! シートタイトルを翻訳してサニタイズ済みのシート名に書き換える戦略。
//!
//! シートは宣言順に処理します。衝突時の連番はこの順序で決まります。

use std::collections::BTreeMap;

use quick_xml::events::Event;

use crate::error::XlsxlateError;
use crate::log::NodeOutcome;
use crate::sheet_name::SheetNameRegistry;
use crate::translator::Translator;
use crate::types::SheetDescriptor;
use crate::xml::{attribute_value, local_name, XmlDocument};

/// シートタイトルのobjectId
pub(crate) const SHEET_TITLE_OBJECT_ID: &str = "sheet_title";

/// ワークブック内の1件のシート宣言
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetDeclaration {
    /// `<sheet>`要素のイベント位置
    pub event_index: usize,
    pub name: String,
    pub relationship_id: Option<String>,
}

/// シートタイトルの書き換え結果
#[derive(Debug, Clone)]
pub(crate) struct TitleRewrite {
    /// 書き換え後のワークブックパート（変更がなければ`None`）
    pub payload: Option<Vec<u8>>,
    /// 宣言順のシート
    pub sheets: Vec<SheetDescriptor>,
    /// ログに使用するシート名と書き換え結果
    pub outcomes: Vec<(String, NodeOutcome)>,
}

/// `<sheet>`宣言を文書順に読み取る
pub(crate) fn read_sheet_declarations(
    doc: &XmlDocument,
) -> Result<Vec<SheetDeclaration>, XlsxlateError> {
    let mut sheets = Vec::new();

    for (i, event) in doc.events().iter().enumerate() {
        let e = match event {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sheet" => e,
            _ => continue,
        };

        let name = attribute_value(doc.part(), e, b"name")?.unwrap_or_default();
        let mut relationship_id = None;
        for attr in e.attributes().with_checks(false) {
            let attr = attr.map_err(|err| XlsxlateError::malformed_part(doc.part(), err))?;
            // `r:id`（プレフィックスはファイルによって異なる）
            if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                let value = attr
                    .unescape_value()
                    .map_err(|err| XlsxlateError::malformed_part(doc.part(), err))?;
                relationship_id = Some(value.into_owned());
            }
        }

        sheets.push(SheetDeclaration {
            event_index: i,
            name,
            relationship_id,
        });
    }

    Ok(sheets)
}

/// シートタイトルを翻訳し、ワークブックパートを書き換える
///
/// # 引数
///
/// * `part` - ワークブックパートのパス
/// * `bytes` - ワークブックパートの内容
/// * `sheet_targets` - リレーションシップID → ワークシートパートパス
/// * `translator` - 翻訳エンジン（`None`の場合はタイトルを翻訳しない）
///
/// 翻訳に失敗したタイトルは元のタイトルのまま登録され、他のシートとの重複のみ解消されます。
pub(crate) fn rewrite_sheet_titles(
    part: &str,
    bytes: &[u8],
    sheet_targets: &BTreeMap<String, String>,
    translator: Option<&dyn Translator>,
) -> Result<TitleRewrite, XlsxlateError> {
    let mut doc = XmlDocument::parse(part, bytes)?;
    let declarations = read_sheet_declarations(&doc)?;

    let mut registry = SheetNameRegistry::new();
    let mut sheets = Vec::with_capacity(declarations.len());
    let mut outcomes = Vec::new();
    let mut changed = false;

    for declaration in declarations {
        let original = declaration.name.clone();

        let safe_title = match translator {
            Some(translator) if !original.trim().is_empty() => {
                match translator.translate(&original, SHEET_TITLE_OBJECT_ID) {
                    Ok(translation) => {
                        let safe = registry.claim(&translation.text);
                        outcomes.push((
                            safe.clone(),
                            NodeOutcome::ok(
                                SHEET_TITLE_OBJECT_ID.to_string(),
                                original.clone(),
                                safe.clone(),
                                translation.engine,
                            ),
                        ));
                        safe
                    }
                    Err(e) => {
                        tracing::warn!("sheet title translation failed for sheet {}: {}", sheets.len() + 1, e);
                        outcomes.push((
                            original.clone(),
                            NodeOutcome::error(
                                SHEET_TITLE_OBJECT_ID.to_string(),
                                original.clone(),
                                e.message().to_string(),
                            ),
                        ));
                        registry.claim(&original)
                    }
                }
            }
            _ => registry.claim(&original),
        };

        if safe_title != original {
            doc.set_attribute(declaration.event_index, "name", &safe_title)?;
            changed = true;
        }

        let worksheet_part = declaration
            .relationship_id
            .as_ref()
            .and_then(|id| sheet_targets.get(id))
            .cloned();

        sheets.push(SheetDescriptor {
            original_title: original,
            relationship_id: declaration.relationship_id,
            safe_title,
            worksheet_part,
        });
    }

    let payload = if changed { Some(doc.to_bytes()?) } else { None };

    Ok(TitleRewrite {
        payload,
        sheets,
        outcomes,
    })
}
