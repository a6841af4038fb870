//! XML Document Module
//!
//! パートのXMLをイベント列として保持する軽量なドキュメント表現。
//! 選択されたテキストノードの内容だけを置き換え、それ以外のイベントは
//! 読み込んだ内容のまま書き戻します。

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XlsxlateError;

/// テキストを持つ葉要素へのハンドル
///
/// `open`は開始タグ、`close`は終了タグのイベント位置です。
/// 内容は`open + 1 .. close`のイベントです。空要素タグは`open == close`で表します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextNode {
    pub open: usize,
    pub close: usize,
}

/// イベント列として保持したXMLドキュメント
#[derive(Debug, Clone)]
pub(crate) struct XmlDocument {
    part: String,
    events: Vec<Event<'static>>,
}

impl XmlDocument {
    /// パートのXMLを解析
    ///
    /// 空白テキストも含めてすべてのイベントを保持します。
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self, XlsxlateError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut events = Vec::new();
        let mut depth: usize = 0;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| XlsxlateError::malformed_part(part, e))?;
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        XlsxlateError::malformed_part(part, "unexpected closing tag")
                    })?;
                }
                Event::Eof => break,
                _ => {}
            }
            events.push(event.into_owned());
            buf.clear();
        }

        if depth != 0 {
            return Err(XlsxlateError::malformed_part(
                part,
                format!("{} element(s) left unclosed", depth),
            ));
        }

        Ok(Self {
            part: part.to_string(),
            events,
        })
    }

    /// パートのパス
    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn events(&self) -> &[Event<'static>] {
        &self.events
    }

    /// ドキュメントをバイト列に書き出す
    pub fn to_bytes(&self) -> Result<Vec<u8>, XlsxlateError> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            writer
                .write_event(event.borrow())
                .map_err(|e| XlsxlateError::malformed_part(&self.part, e))?;
        }
        Ok(writer.into_inner())
    }

    /// `open`位置の開始タグに対応する終了タグの位置を探す
    pub fn closing_index(&self, open: usize) -> Option<usize> {
        if !matches!(self.events.get(open), Some(Event::Start(_))) {
            return None;
        }
        let mut depth = 0usize;
        for (i, event) in self.events.iter().enumerate().skip(open) {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// テキストノードの内容（エスケープ解除済み）を取得
    ///
    /// 子要素を含む場合は直下のテキストのみを連結します。
    pub fn text(&self, node: TextNode) -> Result<String, XlsxlateError> {
        let mut text = String::new();
        // 空要素タグ（open == close）
        if node.close <= node.open {
            return Ok(text);
        }
        for event in &self.events[node.open + 1..node.close] {
            match event {
                Event::Text(t) => {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| XlsxlateError::malformed_part(&self.part, e))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) => {
                    text.push_str(std::str::from_utf8(c)?);
                }
                _ => {}
            }
        }
        Ok(text)
    }

    /// テキストノードの内容を置き換える
    ///
    /// イベント位置を変えないよう、先頭の内容イベントに新しいテキストを入れ、
    /// 残りの内容イベントは空テキストにします。内容が空のノードは対象外です。
    pub fn set_text(&mut self, node: TextNode, text: &str) {
        if node.close <= node.open + 1 {
            return;
        }
        self.events[node.open + 1] = Event::Text(BytesText::new(text).into_owned());
        for event in &mut self.events[node.open + 2..node.close] {
            *event = Event::Text(BytesText::from_escaped(""));
        }
    }

    /// 指定位置の開始タグ（または空要素タグ）の属性を設定する
    ///
    /// 既存の属性は順序を保ったまま残し、同名の属性のみ値を置き換えます。
    pub fn set_attribute(
        &mut self,
        index: usize,
        key: &str,
        value: &str,
    ) -> Result<(), XlsxlateError> {
        let part = self.part.clone();
        let (start, is_empty) = match &self.events[index] {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            _ => {
                return Err(XlsxlateError::malformed_part(
                    &part,
                    "attribute target is not an element",
                ))
            }
        };

        let name = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut rebuilt = BytesStart::new(name);
        let mut replaced = false;
        for attr in start.attributes().with_checks(false) {
            let attr = attr.map_err(|e| XlsxlateError::malformed_part(&part, e))?;
            if attr.key.as_ref() == key.as_bytes() {
                rebuilt.push_attribute((key, value));
                replaced = true;
            } else {
                rebuilt.push_attribute(attr);
            }
        }
        if !replaced {
            rebuilt.push_attribute((key, value));
        }

        let rebuilt = rebuilt.into_owned();
        self.events[index] = if is_empty {
            Event::Empty(rebuilt)
        } else {
            Event::Start(rebuilt)
        };
        Ok(())
    }
}

/// 属性値を取得（エスケープ解除済み）
pub(crate) fn attribute_value(
    part: &str,
    start: &BytesStart<'_>,
    key: &[u8],
) -> Result<Option<String>, XlsxlateError> {
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| XlsxlateError::malformed_part(part, e))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| XlsxlateError::malformed_part(part, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// 名前空間宣言のスコープ
///
/// 開始タグごとに`xmlns`/`xmlns:p`の宣言を積み、プレフィックスを名前空間URIに解決します。
#[derive(Debug, Default)]
pub(crate) struct NamespaceScopes {
    scopes: Vec<Vec<(Vec<u8>, Vec<u8>)>>,
}

impl NamespaceScopes {
    pub fn push(&mut self, start: &BytesStart<'_>) {
        let mut bindings = Vec::new();
        for attr in start.attributes().with_checks(false).flatten() {
            let key = attr.key.as_ref();
            if key == b"xmlns" {
                bindings.push((Vec::new(), attr.value.into_owned()));
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                bindings.push((prefix.to_vec(), attr.value.into_owned()));
            }
        }
        self.scopes.push(bindings);
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// 要素名（QName）の名前空間URIを解決
    pub fn resolve_element(&self, qname: &[u8]) -> Option<&[u8]> {
        let prefix: &[u8] = match qname.iter().position(|&b| b == b':') {
            Some(pos) => &qname[..pos],
            None => b"",
        };
        self.scopes
            .iter()
            .rev()
            .flat_map(|bindings| bindings.iter().rev())
            .find(|(p, _)| p.as_slice() == prefix)
            .map(|(_, uri)| uri.as_slice())
    }
}

/// QNameのローカル名部分
pub(crate) fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().position(|&b| b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}
