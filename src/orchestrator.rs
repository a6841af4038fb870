//! Orchestrator Module
//!
//! 1ファイル分の翻訳処理を順序立てて実行する状態機械。
//!
//! ```text
//! Loaded → SheetsRenamed → CellsRewritten → AncillaryRewritten → DrawingsRewritten → Serialized
//! ```
//!
//! 状態は一方向にのみ進みます。致命的なエラーが発生した場合は処理を中断し、
//! それまでのログを[`ProcessingFailure`]として返します。
//! パッケージとログはこの構造体が排他的に所有し、各パートは高々1回だけ書き換えられます。

use std::collections::HashSet;
use std::path::Path;

use crate::api::PartKind;
use crate::builder::TranslationConfig;
use crate::error::{ProcessingFailure, XlsxlateError};
use crate::log::{TranslationLog, XML_LAYER_SHEET_NAME};
use crate::package::Package;
use crate::parts::{
    is_drawing_part, rewrite_sheet_titles, rewrite_titles_of_parts, selector_for,
    DEFAULT_APP_PROPERTIES_PART,
};
use crate::relationships::{
    rels_part_for, resolve_sheet_targets, RelationshipTable, DEFAULT_SHARED_STRINGS_PART,
    DEFAULT_WORKBOOK_PART, REL_TYPE_COMMENTS, REL_TYPE_EXTENDED_PROPERTIES,
    REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_SHARED_STRINGS, ROOT_RELS_PART,
};
use crate::translator::Translator;
use crate::types::{ProcessingResult, SheetDescriptor};
use crate::xml::rewrite_part;

/// 処理の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Stage {
    Loaded,
    SheetsRenamed,
    CellsRewritten,
    AncillaryRewritten,
    DrawingsRewritten,
    Serialized,
}

/// 1ファイルを処理する
///
/// # 戻り値
///
/// * `Ok(ProcessingResult)` - 出力パッケージとログ
/// * `Err(ProcessingFailure)` - 致命的なエラーと、それまでに記録されたログ
pub(crate) fn process_file(
    file_name: &str,
    bytes: &[u8],
    config: &TranslationConfig,
    translator: &dyn Translator,
) -> Result<ProcessingResult, ProcessingFailure> {
    let orchestrator = Orchestrator::load(file_name, bytes, config, translator).map_err(|error| {
        ProcessingFailure {
            error,
            log: Vec::new(),
        }
    })?;
    orchestrator.run()
}

/// 出力ファイル名を生成（例: `report.xlsx` + `fr` → `report_fr.xlsx`）
///
/// ディレクトリ部分は含めません。
pub(crate) fn output_file_name(file_name: &str, target_language: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, target_language, ext.to_string_lossy()),
        None => format!("{}_{}", stem, target_language),
    }
}

pub(crate) struct Orchestrator<'a> {
    file_name: String,
    config: &'a TranslationConfig,
    translator: &'a dyn Translator,
    package: Package,
    log: TranslationLog,
    stage: Stage,
    workbook_part: String,
    workbook_rels: RelationshipTable,
    sheets: Vec<SheetDescriptor>,
    rewritten: HashSet<String>,
}

impl<'a> Orchestrator<'a> {
    /// パッケージを読み込み、`Loaded`状態の処理器を作成
    pub fn load(
        file_name: &str,
        bytes: &[u8],
        config: &'a TranslationConfig,
        translator: &'a dyn Translator,
    ) -> Result<Self, XlsxlateError> {
        let package = Package::load(bytes, &config.security)?;
        let workbook_part = locate_workbook_part(&package)?;

        tracing::info!(
            "translating {} to '{}' ({} parts, workbook at {})",
            file_name,
            config.target_language,
            package.len(),
            workbook_part
        );

        Ok(Self {
            file_name: file_name.to_string(),
            config,
            translator,
            package,
            log: TranslationLog::new(file_name),
            stage: Stage::Loaded,
            workbook_part,
            workbook_rels: RelationshipTable::empty(),
            sheets: Vec::new(),
            rewritten: HashSet::new(),
        })
    }

    /// すべての段階を実行
    pub fn run(mut self) -> Result<ProcessingResult, ProcessingFailure> {
        match self.run_stages() {
            Ok(output_bytes) => {
                let log_entries = self.log.into_entries();
                tracing::info!(
                    "finished {}: {} log entries",
                    self.file_name,
                    log_entries.len()
                );
                Ok(ProcessingResult {
                    output_file_name: output_file_name(&self.file_name, &self.config.target_language),
                    output_bytes,
                    log_entries,
                    sheets: self.sheets,
                })
            }
            Err(error) => {
                tracing::warn!(
                    "aborted {} at stage {:?}: {}",
                    self.file_name,
                    self.stage,
                    error
                );
                Err(ProcessingFailure {
                    error,
                    log: self.log.into_entries(),
                })
            }
        }
    }

    fn run_stages(&mut self) -> Result<Vec<u8>, XlsxlateError> {
        self.rename_sheets()?;
        self.rewrite_cells()?;
        self.rewrite_ancillary()?;
        self.rewrite_drawings()?;
        self.serialize()
    }

    #[cfg(test)]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stages only move forward");
        tracing::debug!("{}: {:?} -> {:?}", self.file_name, self.stage, next);
        self.stage = next;
    }

    fn enabled(&self, kind: PartKind) -> bool {
        self.config.parts.contains(&kind)
    }

    /// シートタイトルを書き換え、シートとワークシートパートの対応を確定する
    fn rename_sheets(&mut self) -> Result<(), XlsxlateError> {
        let workbook_part = self.workbook_part.clone();
        let workbook_xml = self
            .package
            .part(&workbook_part)
            .ok_or_else(|| {
                XlsxlateError::MalformedPackage(format!("Part '{}' does not exist", workbook_part))
            })?
            .to_vec();

        let rels_part = rels_part_for(&workbook_part);
        let sheet_targets =
            resolve_sheet_targets(&workbook_part, &workbook_xml, self.package.part(&rels_part))?;
        self.workbook_rels = RelationshipTable::for_part(&self.package, &workbook_part)?;
        if self.workbook_rels.is_empty() {
            tracing::warn!(
                "{} has no relationships; worksheet parts cannot be located",
                workbook_part
            );
        } else {
            tracing::debug!("{} relationships in {}", self.workbook_rels.len(), rels_part);
        }

        let translator = if self.enabled(PartKind::SheetTitles) {
            Some(self.translator)
        } else {
            None
        };
        let titles = rewrite_sheet_titles(&workbook_part, &workbook_xml, &sheet_targets, translator)?;

        for (sheet_name, outcome) in titles.outcomes {
            self.log.record(&sheet_name, outcome);
        }
        if let Some(payload) = titles.payload {
            self.package.replace(&workbook_part, payload)?;
        }
        self.rewritten.insert(workbook_part);
        self.sheets = titles.sheets;
        self.rename_titles_of_parts()?;

        self.advance(Stage::SheetsRenamed);
        Ok(())
    }

    /// 拡張プロパティに列挙されたシート名を新しいタイトルに揃える
    fn rename_titles_of_parts(&mut self) -> Result<(), XlsxlateError> {
        let part = root_relationships(&self.package)?
            .targets_of_type(REL_TYPE_EXTENDED_PROPERTIES)
            .next()
            .unwrap_or(DEFAULT_APP_PROPERTIES_PART)
            .to_string();

        let payload = match self.package.part(&part) {
            Some(bytes) => rewrite_titles_of_parts(&part, bytes, &self.sheets)?,
            None => return Ok(()),
        };
        if let Some(payload) = payload {
            self.package.replace(&part, payload)?;
            tracing::debug!("sheet names updated in {}", part);
        }
        self.rewritten.insert(part);
        Ok(())
    }

    /// シートの宣言順にワークシートのセルを書き換える
    fn rewrite_cells(&mut self) -> Result<(), XlsxlateError> {
        if self.enabled(PartKind::Worksheets) {
            for sheet in self.sheets.clone() {
                let part = match &sheet.worksheet_part {
                    Some(part) if self.package.contains(part) => part,
                    Some(part) => {
                        tracing::warn!(
                            "worksheet part {} for sheet '{}' is missing; cells left untouched",
                            part,
                            sheet.safe_title
                        );
                        continue;
                    }
                    None => {
                        tracing::warn!(
                            "relationship for sheet '{}' could not be resolved; cells left untouched",
                            sheet.safe_title
                        );
                        continue;
                    }
                };
                self.rewrite(PartKind::Worksheets, part, &sheet.safe_title)?;
            }
        }

        self.advance(Stage::CellsRewritten);
        Ok(())
    }

    /// 共有文字列、コメントの順に書き換える
    fn rewrite_ancillary(&mut self) -> Result<(), XlsxlateError> {
        if self.enabled(PartKind::SharedStrings) {
            let part = self
                .workbook_rels
                .targets_of_type(REL_TYPE_SHARED_STRINGS)
                .next()
                .unwrap_or(DEFAULT_SHARED_STRINGS_PART)
                .to_string();
            if self.package.contains(&part) {
                self.rewrite(PartKind::SharedStrings, &part, XML_LAYER_SHEET_NAME)?;
            }
        }

        if self.enabled(PartKind::Comments) {
            // シートのリレーションシップから所有者が分かるコメント
            for sheet in self.sheets.clone() {
                let worksheet = match &sheet.worksheet_part {
                    Some(part) if self.package.contains(part) => part,
                    _ => continue,
                };
                let rels = RelationshipTable::for_part(&self.package, worksheet)?;
                let comment_parts: Vec<String> = rels
                    .targets_of_type(REL_TYPE_COMMENTS)
                    .map(str::to_string)
                    .collect();
                for part in comment_parts {
                    if self.package.contains(&part) {
                        self.rewrite(PartKind::Comments, &part, &sheet.safe_title)?;
                    }
                }
            }

            // どのシートからも参照されないコメント
            let mut orphans: Vec<String> = self
                .package
                .part_names()
                .filter(|name| is_comments_part(name))
                .map(str::to_string)
                .collect();
            orphans.sort();
            for part in orphans {
                self.rewrite(PartKind::Comments, &part, XML_LAYER_SHEET_NAME)?;
            }
        }

        self.advance(Stage::AncillaryRewritten);
        Ok(())
    }

    /// 描画・グラフパートをパート名順に書き換える
    fn rewrite_drawings(&mut self) -> Result<(), XlsxlateError> {
        if self.enabled(PartKind::Drawings) {
            let mut parts: Vec<String> = self
                .package
                .part_names()
                .filter(|name| is_drawing_part(name))
                .map(str::to_string)
                .collect();
            parts.sort();
            for part in parts {
                self.rewrite(PartKind::Drawings, &part, XML_LAYER_SHEET_NAME)?;
            }
        }

        self.advance(Stage::DrawingsRewritten);
        Ok(())
    }

    fn serialize(&mut self) -> Result<Vec<u8>, XlsxlateError> {
        let bytes = self.package.save()?;
        self.advance(Stage::Serialized);
        Ok(bytes)
    }

    /// 1パートを書き換え、結果をログに追記する
    ///
    /// 既に書き換えたパートは再度処理しません。
    fn rewrite(&mut self, kind: PartKind, part: &str, sheet_name: &str) -> Result<(), XlsxlateError> {
        if !self.rewritten.insert(part.to_string()) {
            return Ok(());
        }
        let selector = match selector_for(kind, part) {
            Some(selector) => selector,
            None => return Ok(()),
        };

        let output = {
            let bytes = self.package.part(part).ok_or_else(|| {
                XlsxlateError::MalformedPackage(format!("Part '{}' does not exist", part))
            })?;
            rewrite_part(part, bytes, selector.as_ref(), self.translator)?
        };

        self.log.record_all(sheet_name, output.outcomes);
        if let Some(payload) = output.payload {
            self.package.replace(part, payload)?;
        }

        tracing::debug!("{} entries logged after {}", self.log.len(), part);
        Ok(())
    }
}

/// ルートリレーションシップからワークブックパートを探す
fn locate_workbook_part(package: &Package) -> Result<String, XlsxlateError> {
    let part = root_relationships(package)?
        .targets_of_type(REL_TYPE_OFFICE_DOCUMENT)
        .find(|target| package.contains(target))
        .unwrap_or(DEFAULT_WORKBOOK_PART)
        .to_string();

    if !package.contains(&part) {
        return Err(XlsxlateError::MalformedPackage(
            "Workbook part not found".to_string(),
        ));
    }
    Ok(part)
}

fn root_relationships(package: &Package) -> Result<RelationshipTable, XlsxlateError> {
    match package.part(ROOT_RELS_PART) {
        Some(xml) => RelationshipTable::parse(ROOT_RELS_PART, "", xml),
        None => Ok(RelationshipTable::empty()),
    }
}

fn is_comments_part(part: &str) -> bool {
    part.strip_prefix("xl/comments")
        .map_or(false, |rest| rest.ends_with(".xml") && !rest.contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;
    use zip::ZipWriter;

    use crate::builder::WorkbookTranslatorBuilder;
    use crate::translator::{IdentityTranslator, TranslateError, Translation};

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sales" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    const WORKBOOK_RELS: &str = r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
    const SHEET: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Hello</t></is></c></row></sheetData></worksheet>"#;

    fn bracket(text: &str, _: &str) -> Result<Translation, TranslateError> {
        Ok(Translation::new(format!("T[{}]", text), "fake"))
    }

    fn config() -> TranslationConfig {
        WorkbookTranslatorBuilder::new()
            .with_target_language("fr")
            .build()
            .unwrap()
            .config()
            .clone()
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("input.xlsx", "fr"), "input_fr.xlsx");
        assert_eq!(output_file_name("dir/report.v2.xlsx", "ja"), "report.v2_ja.xlsx");
        assert_eq!(output_file_name("noext", "de"), "noext_de");
    }

    #[test]
    fn test_stages_advance_to_serialized() {
        let bytes = build_zip(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET),
        ]);
        let config = config();
        let mut orchestrator = Orchestrator::load("a.xlsx", &bytes, &config, &bracket).unwrap();
        assert_eq!(orchestrator.stage(), Stage::Loaded);

        orchestrator.run_stages().unwrap();
        assert_eq!(orchestrator.stage(), Stage::Serialized);

        let ids: Vec<&str> = orchestrator
            .log
            .entries()
            .iter()
            .map(|e| e.object_id.as_str())
            .collect();
        assert_eq!(ids, vec!["sheet_title", "cell:A1"]);
        // `[` と `]` はシート名に使用できない
        assert_eq!(orchestrator.log.entries()[1].sheet_name, "T_Sales_");
    }

    #[test]
    fn test_missing_workbook_rels_skips_cells() {
        let bytes = build_zip(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/worksheets/sheet1.xml", SHEET),
        ]);
        let result = process_file("a.xlsx", &bytes, &config(), &bracket).unwrap();

        assert_eq!(result.log_entries.len(), 1);
        assert_eq!(result.log_entries[0].object_id, "sheet_title");
        let package = Package::load(&result.output_bytes, &Default::default()).unwrap();
        assert_eq!(package.part("xl/worksheets/sheet1.xml"), Some(SHEET.as_bytes()));
    }

    #[test]
    fn test_workbook_found_through_root_rels() {
        let root_rels = r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="book/main.xml"/></Relationships>"#;
        let bytes = build_zip(&[
            ("_rels/.rels", root_rels),
            ("book/main.xml", WORKBOOK),
        ]);
        let package = Package::load(&bytes, &Default::default()).unwrap();
        assert_eq!(locate_workbook_part(&package).unwrap(), "book/main.xml");
    }

    #[test]
    fn test_missing_workbook_is_fatal() {
        let bytes = build_zip(&[("docProps/app.xml", "<Properties/>")]);
        let failure = process_file("a.xlsx", &bytes, &config(), &IdentityTranslator).unwrap_err();
        assert!(matches!(failure.error, XlsxlateError::MalformedPackage(_)));
        assert!(failure.log.is_empty());
    }

    #[test]
    fn test_malformed_worksheet_aborts_with_partial_log() {
        let bytes = build_zip(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", "<worksheet><sheetData></worksheet>"),
        ]);
        let failure = process_file("a.xlsx", &bytes, &config(), &bracket).unwrap_err();

        assert!(matches!(failure.error, XlsxlateError::MalformedPart { ref part, .. } if part == "xl/worksheets/sheet1.xml"));
        assert_eq!(failure.log.len(), 1);
        assert_eq!(failure.log[0].object_id, "sheet_title");
    }

    #[test]
    fn test_is_comments_part() {
        assert!(is_comments_part("xl/comments1.xml"));
        assert!(!is_comments_part("xl/comments/comment1.xml"));
        assert!(!is_comments_part("xl/threadedComments/threadedComment1.xml"));
    }
}
