//! XML Module
//!
//! パートのXMLを保持するドキュメント表現と、汎用のテキスト書き換え処理を提供するモジュール。

pub(crate) mod document;
pub(crate) mod rewriter;

pub(crate) use document::{attribute_value, local_name, NamespaceScopes, TextNode, XmlDocument};
pub(crate) use rewriter::{rewrite_part, NodeSelector, SelectedNode};
