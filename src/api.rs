//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::Serialize;

/// 書き換え対象のパートの種類
///
/// 各種類は1つの書き換え戦略に対応し、ログはこの列挙の宣言順に出力されます。
/// [`crate::WorkbookTranslatorBuilder::skip_part`]で個別に無効化できます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum PartKind {
    /// ワークブックのシートタイトル（`xl/workbook.xml`の`<sheet name="...">`）
    ///
    /// 翻訳後のタイトルはシート名として使用可能な形にサニタイズされます。
    /// objectIdは`sheet_title`です。
    SheetTitles,

    /// ワークシートのセルテキスト
    ///
    /// インライン文字列と、数式を持たない文字列型セルのキャッシュ値が対象です。
    /// 数式セルと`=`で始まる値は翻訳されません。objectIdは`cell:<座標>`です。
    Worksheets,

    /// 共有文字列テーブル（`xl/sharedStrings.xml`）
    ///
    /// objectIdは`sharedString:<インデックス>`です。
    SharedStrings,

    /// セルのコメント（`xl/comments*.xml`）
    ///
    /// objectIdは`comment:<セル参照>:<ラン番号>`です。
    Comments,

    /// 描画とグラフのテキストラン（`xl/drawings/*.xml`, `xl/charts/*.xml`）
    ///
    /// DrawingMLの`<a:t>`のみが対象で、グラフの数値キャッシュは対象外です。
    /// objectIdは`<パートパス>:<インデックス>`です。
    Drawings,
}

impl PartKind {
    /// すべての種類（処理順）
    pub const ALL: [PartKind; 5] = [
        PartKind::SheetTitles,
        PartKind::Worksheets,
        PartKind::SharedStrings,
        PartKind::Comments,
        PartKind::Drawings,
    ];
}

/// ログエントリの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    /// 翻訳に成功し、テキストが置き換えられた
    Ok,
    /// 翻訳に失敗し、元のテキストが維持された
    Error,
}
