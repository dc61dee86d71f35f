//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// 結果ロケーター列の扱い
///
/// 一括生成の前に、既存のロケーター（URL）を消去するかどうかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum LocatorReset {
    /// 消去せず、処理した行から順に上書きする（デフォルト）
    ///
    /// 途中で失敗した場合、未処理の行には前回のURLが残ります。
    #[default]
    Overwrite,

    /// 生成前にロケーター列の全データ行を空にする
    ///
    /// 途中で失敗した場合でも、前回実行のURLは残りません。
    ClearBeforeRun,
}

/// 生成文書の出力形式
///
/// ローカルバックエンドが文書をファイルとして保存する際の形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DocumentFormat {
    /// プレーンテキスト（`.txt`、デフォルト）
    ///
    /// # 出力例
    ///
    /// ```text
    /// Client ID: 7
    /// ============
    /// Nom : Dupont
    /// ```
    #[default]
    PlainText,

    /// Markdown（`.md`）
    ///
    /// 見出しは`#`/`##`、区切り線は`---`で出力します。
    Markdown,

    /// JSON（`.json`）
    ///
    /// 文書のタイトルとブロックの配列をそのまま出力します。
    Json,
}

impl DocumentFormat {
    /// ファイル拡張子（ドットなし）
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "txt",
            DocumentFormat::Markdown => "md",
            DocumentFormat::Json => "json",
        }
    }
}

/// 差し込み値のエスケープ方式
///
/// フィールド値に文書形式上の特殊文字が含まれる場合の扱いを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ValueEscaping {
    /// そのまま挿入する（デフォルト）
    #[default]
    Verbatim,

    /// Markdownの制御文字をバックスラッシュでエスケープする
    ///
    /// 例: `*VIP*` → `\*VIP\*`
    Markdown,
}

/// 処理をスキップした理由
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SkipReason {
    /// 指定された名前のシートが存在しない
    MissingSheet(String),

    /// 1行目（ヘッダー行）が存在しない、または空
    MissingHeader,

    /// 行番号がデータ行の範囲外（2〜最終行）
    RowOutOfRange {
        /// 要求された行番号（1始まり）
        row: usize,
        /// シートの最終行（1始まり）
        last_row: usize,
    },
}

/// 各操作の結果
///
/// シートの欠落や範囲外の行番号はエラーではなく`Skipped`として返されます。
/// ユーザーが確認を拒否した場合は`Cancelled`です。いずれも副作用はありません。
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum RunOutcome<T> {
    /// 処理が完了した
    Completed(T),

    /// 前提条件を満たさず、何もしなかった
    Skipped(SkipReason),

    /// ユーザーが確認を拒否した
    Cancelled,
}

impl<T> RunOutcome<T> {
    /// 完了した場合の結果を取得
    pub fn completed(self) -> Option<T> {
        match self {
            RunOutcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// 完了したかどうか
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}
