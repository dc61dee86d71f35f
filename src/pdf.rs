//! PDF Module
//!
//! `lopdf`を使用して文書をPDFに変換するモジュール。
//! 標準14フォント（Helvetica）とWinAnsiEncodingのみを使用し、フォントの埋め込みは行いません。

use lopdf::content::{Content, Operation};
use lopdf::{
    dictionary, Dictionary, Document as PdfDocument, Object, ObjectId, Stream, StringFormat,
};

use crate::document::{Block, Document, HeadingLevel};
use crate::error::MergeError;

/// A4サイズ（ポイント）
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;

const BODY_SIZE: i64 = 11;
const HEADING1_SIZE: i64 = 18;
const HEADING2_SIZE: i64 = 14;

/// 1行分の描画命令
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Text { text: String, size: i64, bold: bool },
    Rule,
    Blank,
}

impl Line {
    fn height(&self) -> i64 {
        match self {
            Line::Text { size, .. } => size + size / 2,
            Line::Rule => 12,
            Line::Blank => BODY_SIZE,
        }
    }
}

/// PDFレンダラー
#[derive(Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 文書をPDFのバイト列に変換
    pub fn render(&self, document: &Document) -> Result<Vec<u8>, MergeError> {
        let lines = layout(document);
        let pages = paginate(&lines);

        let mut pdf = PdfDocument::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let regular_id = pdf.add_object(font_dictionary("Helvetica"));
        let bold_id = pdf.add_object(font_dictionary("Helvetica-Bold"));
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in &pages {
            let content = page_content(page);
            let encoded = content
                .encode()
                .map_err(|e| MergeError::Pdf(e.to_string()))?;
            let content_id = pdf.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id: ObjectId = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        pdf.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let info_id = pdf.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(document.title()), StringFormat::Literal),
        });
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.trailer.set("Info", info_id);
        pdf.compress();

        let mut buffer = Vec::new();
        pdf.save_to(&mut buffer)
            .map_err(|e| MergeError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}

fn font_dictionary(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// ブロックを描画行に展開（長い段落は折り返す）
fn layout(document: &Document) -> Vec<Line> {
    let mut lines = Vec::new();
    for block in document.blocks() {
        match block {
            Block::Paragraph { text, heading } => {
                let (size, bold) = match heading {
                    Some(HeadingLevel::Heading1) => (HEADING1_SIZE, true),
                    Some(HeadingLevel::Heading2) => (HEADING2_SIZE, true),
                    None => (BODY_SIZE, false),
                };
                if text.is_empty() {
                    lines.push(Line::Blank);
                    continue;
                }
                for chunk in wrap(text, max_chars(size)) {
                    lines.push(Line::Text {
                        text: chunk,
                        size,
                        bold,
                    });
                }
            }
            Block::HorizontalRule => lines.push(Line::Rule),
        }
    }
    lines
}

/// Helveticaの平均文字幅（約0.5em）から1行の最大文字数を概算
fn max_chars(size: i64) -> usize {
    let usable = PAGE_WIDTH - 2 * MARGIN;
    ((usable * 2) / size).max(1) as usize
}

/// 単語単位で折り返す（1単語が長すぎる場合は文字単位）
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            let rest = chars.split_off(width);
            out.push(chars.into_iter().collect());
            chars = rest;
        }
        current = chars.into_iter().collect();
    }
    out.push(current);
    out
}

/// 描画行をページに分割
fn paginate(lines: &[Line]) -> Vec<Vec<Line>> {
    let usable = PAGE_HEIGHT - 2 * MARGIN;
    let mut pages = Vec::new();
    let mut current = Vec::new();
    let mut used = 0;
    for line in lines {
        if used + line.height() > usable && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
            used = 0;
        }
        used += line.height();
        current.push(line.clone());
    }
    // 空の文書でも1ページは出力する
    pages.push(current);
    pages
}

fn page_content(lines: &[Line]) -> Content {
    let mut operations = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in lines {
        y -= line.height();
        match line {
            Line::Text { text, size, bold } => {
                let font = if *bold { "F2" } else { "F1" };
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(*size)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Integer(MARGIN), Object::Integer(y)],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            Line::Rule => {
                let rule_y = y + line.height() / 2;
                operations.push(Operation::new("w", vec![Object::Integer(1)]));
                operations.push(Operation::new(
                    "m",
                    vec![Object::Integer(MARGIN), Object::Integer(rule_y)],
                ));
                operations.push(Operation::new(
                    "l",
                    vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(rule_y)],
                ));
                operations.push(Operation::new("S", vec![]));
            }
            Line::Blank => {}
        }
    }
    Content { operations }
}

/// 文字列をWinAnsiEncoding（CP1252）のバイト列に変換
///
/// 表現できない文字は`?`に置き換えます。
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7E | 0xA0..=0xFF => ch as u32 as u8,
            _ => match ch {
                '€' => 0x80,
                '‚' => 0x82,
                '„' => 0x84,
                '…' => 0x85,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '\t' => b' ',
                _ => b'?',
            },
        })
        .collect()
}
