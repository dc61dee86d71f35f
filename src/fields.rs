//! Template Fields Module
//!
//! テンプレートに差し込む6つのフィールド（列名と表示ラベル）を定義するモジュール。

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// テンプレートの1フィールド（列名とラベル）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    /// シートの列名（プレースホルダー`{{key}}`のキー）
    pub key: String,
    /// 文書に出力するラベル（例: `"Nom : "`）
    pub label: String,
}

impl FieldBinding {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// プレースホルダートークン（例: `{{ClientName}}`）
    pub fn token(&self) -> String {
        placeholder(&self.key)
    }
}

/// キーからプレースホルダートークンを生成
pub fn placeholder(key: &str) -> String {
    format!("{{{{{}}}}}", key)
}

/// テンプレートのフィールド定義
///
/// 見出し1つ（ID）と本文5つ（氏名、住所、電話、メール、期日）の順序は固定です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFields {
    pub id: FieldBinding,
    pub client_name: FieldBinding,
    pub address: FieldBinding,
    pub phone: FieldBinding,
    pub email: FieldBinding,
    pub due_date: FieldBinding,
}

impl Default for TemplateFields {
    fn default() -> Self {
        Self::with_keys("Id", "ClientName", "Address", "Phone", "Email", "DueDate")
    }
}

impl TemplateFields {
    /// 元の「Données」シートの列名を使うプリセット
    pub fn french() -> Self {
        Self::with_keys(
            "Id",
            "Nom_client",
            "Address_client",
            "Telephone",
            "Email",
            "Date_échéance",
        )
    }

    /// 標準ラベルで列名のみを指定
    pub fn with_keys(
        id: &str,
        client_name: &str,
        address: &str,
        phone: &str,
        email: &str,
        due_date: &str,
    ) -> Self {
        Self {
            id: FieldBinding::new(id, "Client ID: "),
            client_name: FieldBinding::new(client_name, "Nom : "),
            address: FieldBinding::new(address, "Adresse : "),
            phone: FieldBinding::new(phone, "Téléphone : "),
            email: FieldBinding::new(email, "Email : "),
            due_date: FieldBinding::new(due_date, "Date d’échéance : "),
        }
    }

    /// 本文5フィールド（見出しを除く）を出力順に返す
    pub fn body(&self) -> [&FieldBinding; 5] {
        [
            &self.client_name,
            &self.address,
            &self.phone,
            &self.email,
            &self.due_date,
        ]
    }

    /// 全6フィールドを出力順に返す
    pub fn all(&self) -> [&FieldBinding; 6] {
        [
            &self.id,
            &self.client_name,
            &self.address,
            &self.phone,
            &self.email,
            &self.due_date,
        ]
    }

    /// ヘッダー行に書き込む列名のリスト
    pub fn keys(&self) -> Vec<String> {
        self.all().iter().map(|b| b.key.clone()).collect()
    }

    /// キーが空でなく、重複していないことを検証
    pub(crate) fn validate(&self) -> Result<(), MergeError> {
        let keys = self.keys();
        for (i, key) in keys.iter().enumerate() {
            if key.trim().is_empty() {
                return Err(MergeError::Config(
                    "Template field key must not be empty".to_string(),
                ));
            }
            if keys[..i].contains(key) {
                return Err(MergeError::Config(format!(
                    "Duplicate template field key: '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}
