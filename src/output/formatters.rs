//! Output Formatters Implementation
//!
//! 各出力形式の実装を提供するモジュール。

use crate::document::{Block, Document, HeadingLevel};
use crate::error::MergeError;
use std::io::Write;
use unicode_width::UnicodeWidthStr;

/// プレーンテキスト形式のフォーマッター
///
/// 見出しは表示幅に合わせた`=`（レベル1）または`-`（レベル2）で下線を引きます。
pub struct PlainTextFormatter;

impl PlainTextFormatter {
    pub fn render<W: Write>(&self, document: &Document, writer: &mut W) -> Result<(), MergeError> {
        for block in document.blocks() {
            match block {
                Block::Paragraph {
                    text,
                    heading: Some(level),
                } => {
                    let underline = match level {
                        HeadingLevel::Heading1 => "=",
                        HeadingLevel::Heading2 => "-",
                    };
                    // 全角文字は2、半角文字は1として下線の長さを決める
                    let width = text.width().max(1);
                    writeln!(writer, "{}", text)?;
                    writeln!(writer, "{}", underline.repeat(width))?;
                }
                Block::Paragraph {
                    text,
                    heading: None,
                } => writeln!(writer, "{}", text)?,
                Block::HorizontalRule => writeln!(writer, "{}", "_".repeat(40))?,
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Markdown形式のフォーマッター
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn render<W: Write>(&self, document: &Document, writer: &mut W) -> Result<(), MergeError> {
        for block in document.blocks() {
            match block {
                Block::Paragraph {
                    text,
                    heading: Some(HeadingLevel::Heading1),
                } => writeln!(writer, "# {}\n", text)?,
                Block::Paragraph {
                    text,
                    heading: Some(HeadingLevel::Heading2),
                } => writeln!(writer, "## {}\n", text)?,
                Block::Paragraph {
                    text,
                    heading: None,
                } => {
                    if text.is_empty() {
                        writeln!(writer)?;
                    } else {
                        writeln!(writer, "{}\n", text)?;
                    }
                }
                Block::HorizontalRule => writeln!(writer, "---\n")?,
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(&self, document: &Document, writer: &mut W) -> Result<(), MergeError> {
        serde_json::to_writer_pretty(&mut *writer, document)
            .map_err(|e| MergeError::Storage(format!("JSON serialization error: {}", e)))?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
