//! # 通知
//!
//! 送金記録に対する通知メールのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **送金記録と通知の分離**: 通知の失敗は記録済みの送金を取り消さない
//! - **テンプレート分離**: 通知イベントとメール生成は分離（TemplateRenderer は server）
//! - **単発送信**: 再送は行わず、成否を呼び出し元に返す

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::{
    contact::Contact,
    money::Money,
    transfer::{Transfer, TransferId},
};

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// 送信設定が不足している（接続前に検出）
    #[error("通知設定が不正です: {0}")]
    Configuration(String),

    /// SMTP の接続・認証・送信に失敗
    #[error("メール送信に失敗: {0}")]
    Delivery(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    Template(String),
}

impl NotificationError {
    /// ログ・レスポンスで使う種別名
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Delivery(_) => "delivery",
            Self::Template(_) => "template",
        }
    }
}

/// 送金の向き
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferDirection {
    /// 入金（受取人の口座に自動入金された）
    Credit,
    /// 出金（受取人の口座から引き落とされた）
    Debit,
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 送信先の表示名
    pub to_name:   Option<String>,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 送金通知イベント
///
/// 1 件の送金記録につき 1 通、連絡先のメールアドレスへ送信する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferNotification {
    pub transfer_id:      TransferId,
    pub recipient_name:   String,
    pub recipient_email:  String,
    pub amount:           Money,
    pub reference_number: String,
    pub memo:             Option<String>,
    pub recorded_at:      DateTime<Utc>,
}

impl TransferNotification {
    pub fn new(contact: &Contact, transfer: &Transfer) -> Self {
        Self {
            transfer_id:      transfer.id().clone(),
            recipient_name:   contact.name().to_string(),
            recipient_email:  contact.email().to_string(),
            amount:           transfer.amount(),
            reference_number: transfer.reference_number().to_string(),
            memo:             transfer.memo().map(ToString::to_string),
            recorded_at:      transfer.created_at(),
        }
    }

    pub fn direction(&self) -> TransferDirection {
        if self.amount.is_credit() {
            TransferDirection::Credit
        } else {
            TransferDirection::Debit
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        contact::{ContactId, ContactName, Email},
        transfer::{Memo, ReferenceNumber},
    };

    fn make_contact() -> Contact {
        Contact::new(
            ContactId::new(),
            ContactName::new("Alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            Utc::now(),
        )
    }

    fn make_transfer(contact: &Contact, cents: i64) -> Transfer {
        Transfer::new(
            TransferId::new(),
            contact.id().clone(),
            Money::from_cents(cents),
            Some(Memo::new("Rent").unwrap()),
            ReferenceNumber::new("ABCdef123456").unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_送金記録と連絡先から通知イベントを組み立てる() {
        let contact = make_contact();
        let transfer = make_transfer(&contact, 5000);

        let notification = TransferNotification::new(&contact, &transfer);

        assert_eq!(notification.transfer_id, *transfer.id());
        assert_eq!(notification.recipient_name, "Alice");
        assert_eq!(notification.recipient_email, "alice@example.com");
        assert_eq!(notification.reference_number, "ABCdef123456");
        assert_eq!(notification.memo.as_deref(), Some("Rent"));
        assert_eq!(notification.recorded_at, transfer.created_at());
    }

    #[test]
    fn test_金額の符号で送金の向きが決まる() {
        let contact = make_contact();

        let credit = TransferNotification::new(&contact, &make_transfer(&contact, 5000));
        let debit = TransferNotification::new(&contact, &make_transfer(&contact, -2000));

        assert_eq!(credit.direction(), TransferDirection::Credit);
        assert_eq!(debit.direction(), TransferDirection::Debit);
        assert_eq!(debit.direction().to_string(), "debit");
    }

    #[test]
    fn test_通知エラーの種別名() {
        assert_eq!(
            NotificationError::Configuration("x".to_string()).kind(),
            "configuration"
        );
        assert_eq!(NotificationError::Delivery("x".to_string()).kind(), "delivery");
        assert_eq!(NotificationError::Template("x".to_string()).kind(), "template");
    }
}
