//! Settings File Module
//!
//! `mergezero.toml`を読み込み、`MailMergeBuilder`に変換するモジュール。
//! CLIのフラグは設定ファイルの値を上書きし、設定ファイルの値はデフォルト値を上書きします。
//!
//! ```toml
//! [source]
//! workbook = "clients.xlsx"
//! sheet_name = "Données"
//! time_zone = "+02:00"
//!
//! [batch]
//! locator_column = "URL Document"
//! locator_reset = "clear_before_run"
//!
//! [output]
//! format = "markdown"
//! escaping = "verbatim"
//! drafts_dir = "drafts"
//! storage_root = "."
//!
//! [fields]
//! preset = "french"
//! phone = "Tel"
//!
//! [ui]
//! confirm = true
//! report_failures = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::{DocumentFormat, LocatorReset, ValueEscaping};
use crate::builder::{MailMergeBuilder, DEFAULT_LOCATOR_COLUMN};
use crate::error::MergeError;
use crate::fields::TemplateFields;
use crate::workbook::DEFAULT_SHEET_NAME;

/// 既定の設定ファイル名
pub const SETTINGS_FILE_NAME: &str = "mergezero.toml";

/// 設定ファイル全体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeSettings {
    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub fields: FieldSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

/// `[source]`セクション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// 入力ワークブックのパス（CLIの引数で上書き可能）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workbook: Option<PathBuf>,

    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            workbook: None,
            sheet_name: default_sheet_name(),
            time_zone: default_time_zone(),
        }
    }
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.into()
}
fn default_time_zone() -> String {
    "UTC".into()
}

/// `[batch]`セクション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_locator_column")]
    pub locator_column: String,

    #[serde(default)]
    pub locator_reset: LocatorReset,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            locator_column: default_locator_column(),
            locator_reset: LocatorReset::default(),
        }
    }
}

fn default_locator_column() -> String {
    DEFAULT_LOCATOR_COLUMN.into()
}

/// `[output]`セクション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: DocumentFormat,

    #[serde(default)]
    pub escaping: ValueEscaping,

    /// 確定した文書を最初に書き出すディレクトリ
    #[serde(default = "default_drafts_dir")]
    pub drafts_dir: PathBuf,

    /// ワークブックにパスがない場合の出力フォルダの親
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: DocumentFormat::default(),
            escaping: ValueEscaping::default(),
            drafts_dir: default_drafts_dir(),
            storage_root: default_storage_root(),
        }
    }
}

fn default_drafts_dir() -> PathBuf {
    PathBuf::from("drafts")
}
fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

/// フィールド定義のプリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPreset {
    /// `Id, ClientName, Address, Phone, Email, DueDate`
    #[default]
    English,
    /// `Id, Nom_client, Address_client, Telephone, Email, Date_échéance`
    French,
}

/// `[fields]`セクション
///
/// プリセットを基に、指定された列名だけを置き換えます。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    #[serde(default)]
    pub preset: FieldPreset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl FieldSettings {
    /// テンプレートのフィールド定義に変換
    pub fn to_fields(&self) -> TemplateFields {
        let mut fields = match self.preset {
            FieldPreset::English => TemplateFields::default(),
            FieldPreset::French => TemplateFields::french(),
        };
        let overrides = [
            (&mut fields.id, &self.id),
            (&mut fields.client_name, &self.client_name),
            (&mut fields.address, &self.address),
            (&mut fields.phone, &self.phone),
            (&mut fields.email, &self.email),
            (&mut fields.due_date, &self.due_date),
        ];
        for (binding, key) in overrides {
            if let Some(key) = key {
                binding.key = key.clone();
            }
        }
        fields
    }
}

/// `[ui]`セクション
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default = "default_true")]
    pub confirm: bool,

    #[serde(default = "default_true")]
    pub report_failures: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            confirm: true,
            report_failures: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl MergeSettings {
    /// TOML文字列から設定を読み込む
    pub fn from_toml(content: &str) -> Result<Self, MergeError> {
        toml::from_str(content)
            .map_err(|e| MergeError::Config(format!("Invalid settings file: {}", e)))
    }

    /// 設定をTOML文字列に変換
    pub fn to_toml(&self) -> Result<String, MergeError> {
        toml::to_string_pretty(self)
            .map_err(|e| MergeError::Config(format!("Cannot serialize settings: {}", e)))
    }

    /// 設定からビルダーを生成
    pub fn to_builder(&self) -> MailMergeBuilder {
        MailMergeBuilder::new()
            .with_sheet_name(self.source.sheet_name.clone())
            .with_time_zone(self.source.time_zone.clone())
            .with_locator_column(self.batch.locator_column.clone())
            .with_locator_reset(self.batch.locator_reset)
            .with_fields(self.fields.to_fields())
            .with_escaping(self.output.escaping)
            .with_confirmation(self.ui.confirm)
            .with_failure_reporting(self.ui.report_failures)
    }
}

/// 設定ファイルを読み込む
///
/// # 戻り値
///
/// * `Ok(MergeSettings)` - 読み込みに成功した場合
/// * `Err(MergeError::Io)` - ファイルが読めない場合
/// * `Err(MergeError::Config)` - TOMLとして不正な場合
pub fn load_settings(path: impl AsRef<Path>) -> Result<MergeSettings, MergeError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let settings = MergeSettings::from_toml(&content)?;
    tracing::debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}

/// 設定ファイルがあれば読み込み、なければデフォルト値を返す
pub fn load_settings_or_default(path: impl AsRef<Path>) -> Result<MergeSettings, MergeError> {
    let path = path.as_ref();
    if path.exists() {
        load_settings(path)
    } else {
        Ok(MergeSettings::default())
    }
}
