//! Security Module
//!
//! セキュリティ対策を実装するモジュール。
//! 入力ワークブックのサイズ制限と、生成ファイル名のパストラバーサル対策を提供します。

use crate::error::MergeError;

/// ファイル名の最大長（文字数）
const MAX_FILE_NAME_CHARS: usize = 200;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

impl SecurityConfig {
    /// 入力サイズが上限以内か検証
    pub fn check_input_size(&self, bytes: u64) -> Result<(), MergeError> {
        if bytes > self.max_input_file_size {
            return Err(MergeError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes, self.max_input_file_size
            )));
        }
        Ok(())
    }
}

/// ファイル名の検証
///
/// 生成ファイルが保存先ディレクトリの外に書き込まれないよう、ファイル名を検証します。
///
/// # 引数
///
/// * `name` - 検証するファイル名（ディレクトリを含まない）
///
/// # 戻り値
///
/// * `Ok(())` - ファイル名が安全な場合
/// * `Err(MergeError::SecurityViolation)` - 空、`.`/`..`、パス区切り文字や制御文字を含む場合
pub(crate) fn validate_file_name(name: &str) -> Result<(), MergeError> {
    if name.is_empty() {
        return Err(MergeError::SecurityViolation(
            "Empty file name is not allowed".to_string(),
        ));
    }

    if name == "." || name == ".." {
        return Err(MergeError::SecurityViolation(format!(
            "Path traversal detected: {}",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(MergeError::SecurityViolation(format!(
            "Path separator in file name is not allowed: {}",
            name
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(MergeError::SecurityViolation(format!(
            "Control character in file name is not allowed: {:?}",
            name
        )));
    }

    Ok(())
}

/// 文書タイトルを安全なファイル名に変換
///
/// パス区切り文字、Windowsの予約文字、制御文字は`_`に置き換えます。
/// 先頭・末尾のドットと空白は取り除き、結果が空になる場合は`"untitled"`を返します。
pub(crate) fn sanitize_file_name(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
