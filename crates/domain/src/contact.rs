//! # 連絡先
//!
//! 送金の相手先となる連絡先（Contact）のドメインモデル。
//!
//! 連絡先は名前とメールアドレス（通知メールの送信先）を持つ。
//! 作成後は編集・削除操作でのみ変更される。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use etransfer_domain::contact::{Contact, ContactId, ContactName, Email};
//!
//! let contact = Contact::new(
//!     ContactId::new(),
//!     ContactName::new("Alice")?,
//!     Email::new("alice@example.com")?,
//!     chrono::Utc::now(),
//! );
//!
//! assert_eq!(contact.name().as_str(), "Alice");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DomainError;

define_uuid_id! {
    /// 連絡先 ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    pub struct ContactId;
}

define_validated_string! {
    /// 連絡先名（値オブジェクト）
    ///
    /// 前後の空白を除去した 1〜100 文字。
    pub struct ContactName {
        label: "連絡先名",
        max_length: 100,
    }
}

/// メールアドレスの最大文字数（DB: `VARCHAR(255)`）
const MAX_EMAIL_LENGTH: usize = 255;

/// メールアドレス（値オブジェクト）
///
/// 通知メールの送信先。連絡先間で一意。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない（前後の空白は除去する）
    /// - `local@domain` の形式であり、domain に `.` を含む
    /// - 空白を含まない
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
            || value.chars().any(char::is_whitespace)
        {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > MAX_EMAIL_LENGTH {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 連絡先エンティティ
///
/// # 不変条件
///
/// - `email` は連絡先間で一意（DB の UNIQUE 制約で保証）
/// - `updated_at >= created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    id:         ContactId,
    name:       ContactName,
    email:      Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Contact {
    /// 新しい連絡先を作成する
    pub fn new(id: ContactId, name: ContactName, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            email,
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースから連絡先を復元する
    pub fn from_db(
        id: ContactId,
        name: ContactName,
        email: Email,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            created_at,
            updated_at,
        }
    }

    /// 名前とメールアドレスを変更した新インスタンスを返す
    pub fn edited(&self, name: ContactName, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            name,
            email,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    // --- ゲッター ---

    pub fn id(&self) -> &ContactId {
        &self.id
    }

    pub fn name(&self) -> &ContactName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
