//! Output Format Module
//!
//! Strategy Patternによる文書出力形式の抽象化を提供するモジュール。

mod formatters;

use crate::api::DocumentFormat;
use crate::document::Document;
use crate::error::MergeError;
use std::io::Write;

pub use formatters::*;

/// 文書レンダラー（Strategy Pattern）
///
/// 各出力形式（プレーンテキスト, Markdown, JSON）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum DocumentRenderer {
    PlainText,
    Markdown,
    Json,
}

impl DocumentRenderer {
    /// 出力形式からレンダラーを生成
    pub fn from_format(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::PlainText => DocumentRenderer::PlainText,
            DocumentFormat::Markdown => DocumentRenderer::Markdown,
            DocumentFormat::Json => DocumentRenderer::Json,
        }
    }

    /// 文書を指定された形式で出力する
    ///
    /// # 引数
    ///
    /// * `document` - 出力する文書
    /// * `writer` - 出力先のライター
    pub fn render<W: Write>(&self, document: &Document, writer: &mut W) -> Result<(), MergeError> {
        match self {
            DocumentRenderer::PlainText => PlainTextFormatter.render(document, writer),
            DocumentRenderer::Markdown => MarkdownFormatter.render(document, writer),
            DocumentRenderer::Json => JsonFormatter.render(document, writer),
        }
    }

    /// 文書を文字列として出力する
    pub fn render_to_string(&self, document: &Document) -> Result<String, MergeError> {
        let mut buffer = Vec::new();
        self.render(document, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            MergeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}
