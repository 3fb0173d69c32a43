//! # 送金記録
//!
//! 連絡先に紐づく符号付きの送金記録（Transfer）と、そこから導出される残高を扱う。
//!
//! ## 設計方針
//!
//! - **不変**: 送金記録は一度記録したら変更しない（更新パスを持たない）
//! - **残高は導出値**: 残高は保存せず、常に送金記録の合計として計算する
//! - **参照番号**: 12 文字の英数字。通知メールと画面に表示する
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use etransfer_domain::{
//!     contact::ContactId,
//!     money::Money,
//!     transfer::{ReferenceNumber, Transfer, TransferId, TransferStatus},
//! };
//!
//! let transfer = Transfer::new(
//!     TransferId::new(),
//!     ContactId::new(),
//!     Money::parse("50.00")?,
//!     None,
//!     ReferenceNumber::generate(),
//!     chrono::Utc::now(),
//! )?;
//!
//! assert_eq!(transfer.status(), TransferStatus::Completed);
//! assert!(transfer.is_credit());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, contact::ContactId, money::Money};

define_uuid_id! {
    /// 送金記録 ID（一意識別子）
    pub struct TransferId;
}

// =========================================================================
// ReferenceNumber（参照番号）
// =========================================================================

/// 参照番号の文字数
pub const REFERENCE_NUMBER_LENGTH: usize = 12;

/// 参照番号（値オブジェクト）
///
/// 12 文字の ASCII 英数字。送金記録間で一意（DB の UNIQUE 制約で保証）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    /// ランダムな参照番号を生成する
    pub fn generate() -> Self {
        Self(Alphanumeric.sample_string(&mut rand::rng(), REFERENCE_NUMBER_LENGTH))
    }

    /// 既存の参照番号を検証して復元する
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.len() != REFERENCE_NUMBER_LENGTH
            || !value.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(DomainError::Validation(format!(
                "参照番号は {REFERENCE_NUMBER_LENGTH} 文字の英数字である必要があります"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// Memo（メモ）
// =========================================================================

define_validated_string! {
    /// 送金メモ（値オブジェクト）
    ///
    /// 最大 400 文字。通知メールの本文に表示される。
    pub struct Memo {
        label: "メモ",
        max_length: 400,
    }
}

impl Memo {
    /// 任意入力のメモを作成する
    ///
    /// `None` または空白のみの入力はメモなしとして扱う。
    pub fn optional(value: Option<String>) -> Result<Option<Self>, DomainError> {
        match value {
            Some(v) if !v.trim().is_empty() => Self::new(v).map(Some),
            _ => Ok(None),
        }
    }
}

// =========================================================================
// TransferStatus（送金ステータス）
// =========================================================================

/// 送金ステータス
///
/// 記録時点で完了扱いとする。`Pending` は既存データとの互換のために残す。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Completed,
}

// =========================================================================
// Transfer（送金記録エンティティ）
// =========================================================================

/// 送金記録エンティティ
///
/// # 不変条件
///
/// - `amount` はゼロではない（正: 入金、負: 出金）
/// - `contact_id` は既存の連絡先を参照する（DB の外部キーで保証）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    id: TransferId,
    contact_id: ContactId,
    amount: Money,
    memo: Option<Memo>,
    reference_number: ReferenceNumber,
    status: TransferStatus,
    created_at: DateTime<Utc>,
}

impl Transfer {
    /// 新しい送金記録を作成する
    ///
    /// # エラー
    ///
    /// 金額がゼロの場合は `DomainError::Validation` を返す。
    pub fn new(
        id: TransferId,
        contact_id: ContactId,
        amount: Money,
        memo: Option<Memo>,
        reference_number: ReferenceNumber,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if amount.is_zero() {
            return Err(DomainError::Validation(
                "金額はゼロ以外である必要があります".to_string(),
            ));
        }

        Ok(Self {
            id,
            contact_id,
            amount,
            memo,
            reference_number,
            status: TransferStatus::Completed,
            created_at: now,
        })
    }

    /// データベースから送金記録を復元する
    pub fn from_db(
        id: TransferId,
        contact_id: ContactId,
        amount: Money,
        memo: Option<Memo>,
        reference_number: ReferenceNumber,
        status: TransferStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            contact_id,
            amount,
            memo,
            reference_number,
            status,
            created_at,
        }
    }

    /// 入金か（金額が正）
    pub fn is_credit(&self) -> bool {
        self.amount.is_credit()
    }

    // --- ゲッター ---

    pub fn id(&self) -> &TransferId {
        &self.id
    }

    pub fn contact_id(&self) -> &ContactId {
        &self.contact_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn memo(&self) -> Option<&Memo> {
        self.memo.as_ref()
    }

    pub fn reference_number(&self) -> &ReferenceNumber {
        &self.reference_number
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 送金記録の合計から残高を計算する
///
/// 送金記録がなければゼロ。合計がオーバーフローする場合は `DomainError::Validation`。
pub fn balance_of<'a>(transfers: impl IntoIterator<Item = &'a Transfer>) -> Result<Money, DomainError> {
    transfers
        .into_iter()
        .try_fold(Money::ZERO, |acc, t| acc.checked_add(t.amount()))
        .ok_or_else(|| DomainError::Validation("残高が表現可能な範囲を超えています".to_string()))
}
