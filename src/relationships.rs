//! Relationship Resolver Module
//!
//! リレーションシップパート（`*.rels`）を解析し、リレーションシップID →
//! パートパスの表を構築するモジュール。
//! ワークブックのシート宣言とワークシートパートの対応付けに使用します。

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::XlsxlateError;
use crate::package::Package;

/// 既定のワークブックパート
pub(crate) const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// 既定の共有文字列パート
pub(crate) const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// パッケージのルートリレーションシップ
pub(crate) const ROOT_RELS_PART: &str = "_rels/.rels";

/// ワークシートのルートパス
const WORKSHEET_ROOT: &str = "xl/";

pub(crate) const REL_TYPE_OFFICE_DOCUMENT: &str = "/officeDocument";
pub(crate) const REL_TYPE_SHARED_STRINGS: &str = "/sharedStrings";
pub(crate) const REL_TYPE_COMMENTS: &str = "/comments";
pub(crate) const REL_TYPE_EXTENDED_PROPERTIES: &str = "/extended-properties";

/// 1件のリレーションシップ
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    /// 正規化済みのターゲットパートパス
    pub target: String,
    /// リレーションシップタイプ（URI）
    pub rel_type: String,
    /// `TargetMode="External"`の場合true
    pub external: bool,
}

/// リレーションシップID → ターゲットの表
///
/// ファイルごとに1度構築され、以降は読み取り専用です。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RelationshipTable {
    by_id: BTreeMap<String, Relationship>,
}

impl RelationshipTable {
    /// 空の表（リレーションシップパートが存在しない場合）
    pub fn empty() -> Self {
        Self::default()
    }

    /// リレーションシップパートを解析
    ///
    /// # 引数
    ///
    /// * `rels_part` - 解析するパートのパス（エラーメッセージ用）
    /// * `source_part` - リレーションシップの起点パート（相対ターゲットの基準）
    /// * `xml` - パートの内容
    pub fn parse(rels_part: &str, source_part: &str, xml: &[u8]) -> Result<Self, XlsxlateError> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut by_id = BTreeMap::new();

        loop {
            match reader.read_event_into(&mut buf) {
                // Event::Emptyは自己終了タグの場合に発生
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = String::new();
                    let mut external = false;

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| XlsxlateError::malformed_part(rels_part, e))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| XlsxlateError::malformed_part(rels_part, e))?;
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value.into_owned()),
                            b"Target" => target = Some(value.into_owned()),
                            b"Type" => rel_type = value.into_owned(),
                            b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                            _ => {}
                        }
                    }

                    // IDまたはターゲットが欠落している場合はスキップ
                    if let (Some(id), Some(target)) = (id, target) {
                        let target = if external {
                            target
                        } else {
                            resolve_target(source_part, &target)
                        };
                        by_id.insert(
                            id,
                            Relationship {
                                target,
                                rel_type,
                                external,
                            },
                        );
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxlateError::malformed_part(rels_part, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { by_id })
    }

    /// パッケージ内のパートに対するリレーションシップを読み込む
    ///
    /// リレーションシップパートが存在しない場合は空の表を返します。
    pub fn for_part(package: &Package, source_part: &str) -> Result<Self, XlsxlateError> {
        let rels_part = rels_part_for(source_part);
        match package.part(&rels_part) {
            Some(xml) => Self::parse(&rels_part, source_part, xml),
            None => Ok(Self::empty()),
        }
    }

    /// IDに対応する内部パートのパスを取得
    pub fn target(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .filter(|rel| !rel.external)
            .map(|rel| rel.target.as_str())
    }

    /// タイプの末尾が一致する内部リレーションシップのターゲットを列挙（ID順）
    pub fn targets_of_type<'a>(&'a self, type_suffix: &'a str) -> impl Iterator<Item = &'a str> {
        self.by_id
            .values()
            .filter(move |rel| !rel.external && rel.rel_type.ends_with(type_suffix))
            .map(|rel| rel.target.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// ワークブックに宣言されたシートのIDを、ワークシートパートのパスに解決する
///
/// # 引数
///
/// * `workbook_part` - ワークブックパートのパス
/// * `workbook_xml` - ワークブックパートの内容
/// * `rels_xml` - ワークブックのリレーションシップパートの内容（存在しない場合は`None`）
///
/// # 戻り値
///
/// シートのリレーションシップID → ワークシートパートパス。
/// リレーションシップパートが存在しない場合は空のマッピングを返します。
pub(crate) fn resolve_sheet_targets(
    workbook_part: &str,
    workbook_xml: &[u8],
    rels_xml: Option<&[u8]>,
) -> Result<BTreeMap<String, String>, XlsxlateError> {
    let rels_xml = match rels_xml {
        Some(xml) => xml,
        None => return Ok(BTreeMap::new()),
    };

    let table = RelationshipTable::parse(&rels_part_for(workbook_part), workbook_part, rels_xml)?;

    let mut targets = BTreeMap::new();
    for id in declared_sheet_ids(workbook_part, workbook_xml)? {
        if let Some(target) = table.target(&id) {
            targets.insert(id, target.to_string());
        }
    }
    Ok(targets)
}

/// ワークブックの`<sheet r:id="...">`を宣言順に列挙
fn declared_sheet_ids(
    workbook_part: &str,
    workbook_xml: &[u8],
) -> Result<Vec<String>, XlsxlateError> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut ids = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| XlsxlateError::malformed_part(workbook_part, e))?;
                    if attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| XlsxlateError::malformed_part(workbook_part, e))?;
                        ids.push(value.into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxlateError::malformed_part(workbook_part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

/// パートに対応するリレーションシップパートのパス
///
/// 例: `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
pub(crate) fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// リレーションシップのターゲットをパッケージ内の絶対パートパスに正規化
///
/// - `/`で始まるターゲットはパッケージルートからのパスとして扱う
/// - ワークシートのルートパス（`xl/`）で始まるターゲットはそのまま扱う
/// - それ以外は起点パートのディレクトリからの相対パスとして解決する
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    // URIフラグメントはパート名に含まれない
    let target = target.split('#').next().unwrap_or(target);

    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    if target.starts_with(WORKSHEET_ROOT) {
        return normalize(target);
    }

    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
