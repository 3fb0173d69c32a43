//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するエンティティ生成ヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use etransfer_domain::{
    contact::{Contact, ContactId, ContactName, Email},
    money::Money,
    transfer::{Memo, ReferenceNumber, Transfer, TransferId},
};
use etransfer_infra::repository::{ContactRepository, PostgresContactRepository};
use sqlx::PgPool;

/// テスト用の固定日時
pub fn test_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// 連絡先を作成する
pub fn create_test_contact(name: &str, email: &str) -> Contact {
    Contact::new(
        ContactId::new(),
        ContactName::new(name).unwrap(),
        Email::new(email).unwrap(),
        test_now(),
    )
}

/// 連絡先を作成して DB に保存する
pub async fn insert_test_contact(pool: &PgPool, name: &str, email: &str) -> Contact {
    let contact = create_test_contact(name, email);
    PostgresContactRepository::new(pool.clone())
        .insert(&contact)
        .await
        .expect("連絡先の作成に失敗");
    contact
}

/// `test_now()` から `offset_secs` 秒後の送金記録を作成する
pub fn create_test_transfer(contact: &Contact, amount: &str, offset_secs: i64) -> Transfer {
    Transfer::new(
        TransferId::new(),
        contact.id().clone(),
        Money::parse(amount).unwrap(),
        Memo::optional(Some(format!("テスト {amount}"))).unwrap(),
        ReferenceNumber::generate(),
        test_now() + Duration::seconds(offset_secs),
    )
    .unwrap()
}
