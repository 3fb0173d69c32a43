//! # テスト用モック
//!
//! ユースケーステスト・ハンドラテストで使用するインメモリのリポジトリと通知送信。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! etransfer-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 連絡先と送金記録のモックは [`MockLedger`] が持つ同じストアを共有し、
//! PostgreSQL の制約（メールアドレスの一意性、外部キー）を再現する。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etransfer_domain::{
    contact::{Contact, ContactId},
    money::Money,
    notification::{EmailMessage, NotificationError},
    transfer::Transfer,
};

use crate::{
    error::InfraError,
    notification::NotificationSender,
    repository::{ContactRepository, RecentTransfer, TransferRepository},
};

#[derive(Default)]
struct LedgerStore {
    contacts:  Vec<Contact>,
    transfers: Vec<Transfer>,
}

// ===== MockLedger =====

/// 連絡先と送金記録のインメモリストア
#[derive(Clone, Default)]
pub struct MockLedger {
    store: Arc<Mutex<LedgerStore>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact_repository(&self) -> MockContactRepository {
        MockContactRepository {
            store: self.store.clone(),
        }
    }

    pub fn transfer_repository(&self) -> MockTransferRepository {
        MockTransferRepository {
            store:       self.store.clone(),
            fail_insert: Arc::new(Mutex::new(false)),
        }
    }

    /// 連絡先を直接追加する（テストの前提データ用）
    pub fn add_contact(&self, contact: Contact) {
        self.store.lock().unwrap().contacts.push(contact);
    }

    /// 送金記録を直接追加する（テストの前提データ用）
    pub fn add_transfer(&self, transfer: Transfer) {
        self.store.lock().unwrap().transfers.push(transfer);
    }

    /// 保存されている送金記録の件数
    pub fn transfer_count(&self) -> usize {
        self.store.lock().unwrap().transfers.len()
    }

    /// 保存されている連絡先の件数
    pub fn contact_count(&self) -> usize {
        self.store.lock().unwrap().contacts.len()
    }
}

// ===== MockContactRepository =====

#[derive(Clone)]
pub struct MockContactRepository {
    store: Arc<Mutex<LedgerStore>>,
}

impl MockContactRepository {
    pub fn new() -> Self {
        MockLedger::new().contact_repository()
    }
}

impl Default for MockContactRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContactRepository for MockContactRepository {
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<Contact>, InfraError> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut contacts: Vec<Contact> = self
            .store
            .lock()
            .unwrap()
            .contacts
            .iter()
            .filter(|c| match &needle {
                Some(needle) => {
                    c.name().as_str().to_lowercase().contains(needle)
                        || c.email().as_str().to_lowercase().contains(needle)
                }
                None => true,
            })
            .cloned()
            .collect();
        contacts.sort_by(|a, b| {
            a.name()
                .as_str()
                .cmp(b.name().as_str())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });

        Ok(contacts)
    }

    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, InfraError> {
        Ok(self
            .store
            .lock()
            .unwrap()
            .contacts
            .iter()
            .find(|c| c.id() == id)
            .cloned())
    }

    async fn insert(&self, contact: &Contact) -> Result<(), InfraError> {
        let mut store = self.store.lock().unwrap();
        if store.contacts.iter().any(|c| c.email() == contact.email()) {
            return Err(InfraError::conflict(
                "contacts_email_key",
                contact.email().as_str(),
            ));
        }
        store.contacts.push(contact.clone());
        Ok(())
    }

    async fn update(&self, contact: &Contact) -> Result<(), InfraError> {
        let mut store = self.store.lock().unwrap();
        if store
            .contacts
            .iter()
            .any(|c| c.id() != contact.id() && c.email() == contact.email())
        {
            return Err(InfraError::conflict(
                "contacts_email_key",
                contact.email().as_str(),
            ));
        }
        if let Some(existing) = store.contacts.iter_mut().find(|c| c.id() == contact.id()) {
            *existing = contact.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &ContactId) -> Result<bool, InfraError> {
        let mut store = self.store.lock().unwrap();
        if store.transfers.iter().any(|t| t.contact_id() == id) {
            return Err(InfraError::foreign_key("transfers_contact_id_fkey"));
        }
        let before = store.contacts.len();
        store.contacts.retain(|c| c.id() != id);
        Ok(store.contacts.len() < before)
    }
}

// ===== MockTransferRepository =====

#[derive(Clone)]
pub struct MockTransferRepository {
    store:       Arc<Mutex<LedgerStore>>,
    fail_insert: Arc<Mutex<bool>>,
}

impl MockTransferRepository {
    pub fn new() -> Self {
        MockLedger::new().transfer_repository()
    }

    /// 以降の `insert` をデータベースエラーにする
    pub fn fail_inserts(&self) {
        *self.fail_insert.lock().unwrap() = true;
    }
}

impl Default for MockTransferRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferRepository for MockTransferRepository {
    async fn insert(&self, transfer: &Transfer) -> Result<(), InfraError> {
        if *self.fail_insert.lock().unwrap() {
            return Err(sqlx::Error::PoolTimedOut.into());
        }

        let mut store = self.store.lock().unwrap();
        if !store.contacts.iter().any(|c| c.id() == transfer.contact_id()) {
            return Err(InfraError::foreign_key("transfers_contact_id_fkey"));
        }
        if store.transfers.iter().any(|t| t.id() == transfer.id()) {
            return Err(InfraError::conflict(
                "transfers_pkey",
                transfer.id().to_string(),
            ));
        }
        if store
            .transfers
            .iter()
            .any(|t| t.reference_number() == transfer.reference_number())
        {
            return Err(InfraError::conflict(
                "transfers_reference_number_key",
                transfer.reference_number().as_str(),
            ));
        }
        store.transfers.push(transfer.clone());
        Ok(())
    }

    async fn find_by_contact(&self, contact_id: &ContactId) -> Result<Vec<Transfer>, InfraError> {
        let mut transfers: Vec<Transfer> = self
            .store
            .lock()
            .unwrap()
            .transfers
            .iter()
            .filter(|t| t.contact_id() == contact_id)
            .cloned()
            .collect();
        transfers.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
        });
        Ok(transfers)
    }

    async fn sum_by_contact(&self, contact_id: &ContactId) -> Result<Money, InfraError> {
        let cents = self
            .store
            .lock()
            .unwrap()
            .transfers
            .iter()
            .filter(|t| t.contact_id() == contact_id)
            .map(|t| t.amount().cents())
            .sum();
        Ok(Money::from_cents(cents))
    }

    async fn find_recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentTransfer>, InfraError> {
        let store = self.store.lock().unwrap();
        let mut recent: Vec<RecentTransfer> = store
            .transfers
            .iter()
            .filter(|t| t.created_at() >= since)
            .filter_map(|t| {
                store
                    .contacts
                    .iter()
                    .find(|c| c.id() == t.contact_id())
                    .map(|c| RecentTransfer {
                        transfer:      t.clone(),
                        contact_name:  c.name().to_string(),
                        contact_email: c.email().to_string(),
                    })
            })
            .collect();
        recent.sort_by(|a, b| {
            b.transfer
                .created_at()
                .cmp(&a.transfer.created_at())
                .then_with(|| b.transfer.id().as_uuid().cmp(a.transfer.id().as_uuid()))
        });
        recent.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(recent)
    }
}

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送信されたメールの一覧
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== FailingNotificationSender =====

/// 常に送信に失敗するモック
#[derive(Clone)]
pub struct FailingNotificationSender {
    make_error: fn() -> NotificationError,
}

impl FailingNotificationSender {
    /// SMTP 認証・接続失敗を模擬する
    pub fn delivery() -> Self {
        Self {
            make_error: || NotificationError::Delivery("535 authentication failed".to_string()),
        }
    }

    /// 送信設定の不足を模擬する
    pub fn configuration() -> Self {
        Self {
            make_error: || {
                NotificationError::Configuration("SMTP_SENDER_EMAIL が設定されていません".to_string())
            },
        }
    }
}

#[async_trait]
impl NotificationSender for FailingNotificationSender {
    async fn send_email(&self, _email: &EmailMessage) -> Result<(), NotificationError> {
        Err((self.make_error)())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use etransfer_domain::{
        contact::{ContactName, Email},
        transfer::{ReferenceNumber, TransferId},
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::InfraErrorKind;

    fn make_contact(name: &str, email: &str) -> Contact {
        Contact::new(
            ContactId::new(),
            ContactName::new(name).unwrap(),
            Email::new(email).unwrap(),
            Utc::now(),
        )
    }

    fn make_transfer(contact: &Contact, cents: i64, at: DateTime<Utc>) -> Transfer {
        Transfer::new(
            TransferId::new(),
            contact.id().clone(),
            Money::from_cents(cents),
            None,
            ReferenceNumber::generate(),
            at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_同じメールアドレスの連絡先はconflictになる() {
        let ledger = MockLedger::new();
        let repo = ledger.contact_repository();
        repo.insert(&make_contact("Alice", "alice@example.com"))
            .await
            .unwrap();

        let err = repo
            .insert(&make_contact("Alice 2", "alice@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::Conflict { .. }));
        assert_eq!(ledger.contact_count(), 1);
    }

    #[tokio::test]
    async fn test_存在しない連絡先への送金記録は外部キー違反になる() {
        let ledger = MockLedger::new();
        let orphan = make_contact("Ghost", "ghost@example.com");

        let err = ledger
            .transfer_repository()
            .insert(&make_transfer(&orphan, 5000, Utc::now()))
            .await
            .unwrap_err();

        assert!(err.is_foreign_key_violation());
        assert_eq!(ledger.transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_送金記録が残る連絡先の削除は外部キー違反になる() {
        let ledger = MockLedger::new();
        let alice = make_contact("Alice", "alice@example.com");
        ledger.add_contact(alice.clone());
        ledger.add_transfer(make_transfer(&alice, 5000, Utc::now()));

        let err = ledger
            .contact_repository()
            .delete(alice.id())
            .await
            .unwrap_err();

        assert!(err.is_foreign_key_violation());
    }

    #[tokio::test]
    async fn test_残高は送金記録の合計() {
        let ledger = MockLedger::new();
        let alice = make_contact("Alice", "alice@example.com");
        ledger.add_contact(alice.clone());
        let now = Utc::now();
        for cents in [5000, -2000, 1000] {
            ledger.add_transfer(make_transfer(&alice, cents, now));
        }

        let balance = ledger
            .transfer_repository()
            .sum_by_contact(alice.id())
            .await
            .unwrap();

        assert_eq!(balance, Money::from_cents(4000));
    }

    #[tokio::test]
    async fn test_最近の送金記録は新しい順でlimit件まで() {
        let ledger = MockLedger::new();
        let alice = make_contact("Alice", "alice@example.com");
        ledger.add_contact(alice.clone());
        let base = Utc::now();
        for (i, cents) in [100, 200, 300].into_iter().enumerate() {
            ledger.add_transfer(make_transfer(&alice, cents, base + Duration::seconds(i as i64)));
        }

        let recent = ledger
            .transfer_repository()
            .find_recent(base - Duration::days(1), 2)
            .await
            .unwrap();

        let amounts: Vec<i64> = recent.iter().map(|r| r.transfer.amount().cents()).collect();
        assert_eq!(amounts, vec![300, 200]);
        assert_eq!(recent[0].contact_name, "Alice");
    }
}
