//! Document Module
//!
//! 生成文書のモデルと、そのライフサイクル（状態遷移）を定義するモジュール。
//!
//! ```text
//! Created → Populated → Finalized → Relocated → Rendered
//!                           └──────────────────→ Rendered
//! ```
//!
//! 逆方向の遷移はなく、確定（Finalized）後の差し込みはエラーになります。

use serde::Serialize;

use crate::error::MergeError;
use crate::types::Locator;

/// 文書の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DocumentState {
    /// 作成直後（本文なし）
    Created,
    /// 本文の追加・置換中
    Populated,
    /// 保存して閉じた（以降は変更不可）
    Finalized,
    /// 保存先フォルダへ移動済み
    Relocated,
    /// PDFへ変換済み
    Rendered,
}

impl DocumentState {
    /// 指定された状態へ遷移できるか
    pub fn can_transition_to(self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Created, Populated)
                | (Populated, Populated)
                | (Created, Finalized)
                | (Populated, Finalized)
                | (Finalized, Relocated)
                | (Finalized, Rendered)
                | (Relocated, Rendered)
        )
    }
}

/// 見出しレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    Heading1,
    Heading2,
}

/// 文書本文の要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// 段落（`heading`が`Some`の場合は見出し）
    Paragraph {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        heading: Option<HeadingLevel>,
    },
    /// 水平線
    HorizontalRule,
}

/// 文書
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// 文書サービスが割り当てたID
    id: String,
    title: String,
    blocks: Vec<Block>,
    #[serde(skip)]
    state: DocumentState,
}

impl Document {
    /// 空の文書を生成（`Created`状態）
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks: Vec::new(),
            state: DocumentState::Created,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// 通常の段落を追加
    pub fn append_paragraph(&mut self, text: impl Into<String>) -> Result<(), MergeError> {
        self.push(Block::Paragraph {
            text: text.into(),
            heading: None,
        })
    }

    /// 見出し段落を追加
    pub fn append_heading(
        &mut self,
        text: impl Into<String>,
        level: HeadingLevel,
    ) -> Result<(), MergeError> {
        self.push(Block::Paragraph {
            text: text.into(),
            heading: Some(level),
        })
    }

    /// 水平線を追加
    pub fn append_horizontal_rule(&mut self) -> Result<(), MergeError> {
        self.push(Block::HorizontalRule)
    }

    /// 本文中のすべての`pattern`を`replacement`に置換し、置換した数を返す
    ///
    /// 正規表現ではなくリテラルな部分文字列として扱います。
    pub fn replace_text(&mut self, pattern: &str, replacement: &str) -> Result<usize, MergeError> {
        self.transition(DocumentState::Populated)?;
        if pattern.is_empty() {
            return Ok(0);
        }

        let mut count = 0;
        for block in &mut self.blocks {
            if let Block::Paragraph { text, .. } = block {
                let hits = text.matches(pattern).count();
                if hits > 0 {
                    *text = text.replace(pattern, replacement);
                    count += hits;
                }
            }
        }
        Ok(count)
    }

    /// 本文をプレーンテキストとして取得（段落ごとに改行）
    pub fn body_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph { text, .. } => out.push_str(text),
                Block::HorizontalRule => out.push_str("---"),
            }
            out.push('\n');
        }
        out
    }

    /// 保存して閉じる（`Finalized`状態へ）
    pub fn finalize(&mut self) -> Result<(), MergeError> {
        self.transition(DocumentState::Finalized)
    }

    /// 状態を遷移させる
    pub fn transition(&mut self, next: DocumentState) -> Result<(), MergeError> {
        if !self.state.can_transition_to(next) {
            return Err(MergeError::InvalidTransition {
                document: self.title.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    fn push(&mut self, block: Block) -> Result<(), MergeError> {
        self.transition(DocumentState::Populated)?;
        self.blocks.push(block);
        Ok(())
    }
}

/// 文書サービスで確定された文書
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// 確定済みの文書
    pub document: Document,

    /// 文書を開くためのロケーター
    pub locator: Locator,

    /// 現在の保存場所（フォルダ名またはディレクトリのパス）
    pub location: String,
}

impl StoredDocument {
    pub fn title(&self) -> &str {
        self.document.title()
    }

    pub fn state(&self) -> DocumentState {
        self.document.state()
    }
}
