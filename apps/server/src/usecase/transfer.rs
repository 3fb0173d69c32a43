//! 送金ユースケース
//!
//! 送金記録の登録と通知、送金履歴の照会を扱う。
//!
//! ## 送金記録の登録
//!
//! 1. 連絡先の存在確認（なければ NotFound、書き込みなし）
//! 2. 金額・メモの検証
//! 3. 送金記録を 1 行挿入
//! 4. 通知メールを 1 回だけ送信
//!
//! 通知の失敗は記録済みの送金を取り消さない。結果は [`NotificationOutcome`] として返す。

use std::sync::Arc;

use chrono::Duration;
use etransfer_domain::{
    clock::Clock,
    contact::{Contact, ContactId},
    money::Money,
    transfer::{Memo, ReferenceNumber, Transfer, TransferId},
};
use etransfer_infra::repository::{ContactRepository, RecentTransfer, TransferRepository};
use etransfer_shared::{event_log::event, log_business_event};

use super::{contact::contact_not_found, notification::NotificationService};
use crate::error::ServerError;

/// 最近の送金記録の既定の対象日数
pub const DEFAULT_RECENT_DAYS: i64 = 30;
/// 最近の送金記録の既定の最大件数
pub const DEFAULT_RECENT_LIMIT: i64 = 100;

const MAX_RECENT_DAYS: i64 = 366;
const MAX_RECENT_LIMIT: i64 = 500;

/// 送金記録の入力
///
/// 金額は `"50"`, `"-20.00"`, `"1,234.56"` 形式の文字列。
pub struct RecordTransferInput {
    pub contact_id: ContactId,
    pub amount:     String,
    pub memo:       Option<String>,
}

/// 検証済みの送金内容（未記録）
///
/// `id` は記録時の送金 ID になる。同じ下書きは二度記録できない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub id:      TransferId,
    pub contact: Contact,
    pub amount:  Money,
    pub memo:    Option<Memo>,
}

/// 通知の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// 送信成功
    Sent,
    /// 送信失敗（送金記録は保存済み）
    Failed { kind: &'static str, message: String },
}

/// 送金記録の登録結果
#[derive(Debug, Clone)]
pub struct RecordTransferOutput {
    pub contact:      Contact,
    pub transfer:     Transfer,
    pub notification: NotificationOutcome,
}

/// 送金ユースケース
pub struct TransferUseCaseImpl {
    contact_repository:   Arc<dyn ContactRepository>,
    transfer_repository:  Arc<dyn TransferRepository>,
    notification_service: Arc<NotificationService>,
    clock:                Arc<dyn Clock>,
}

impl TransferUseCaseImpl {
    pub fn new(
        contact_repository: Arc<dyn ContactRepository>,
        transfer_repository: Arc<dyn TransferRepository>,
        notification_service: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contact_repository,
            transfer_repository,
            notification_service,
            clock,
        }
    }

    /// 送金内容を検証する（記録はしない）
    pub async fn prepare_transfer(
        &self,
        input: RecordTransferInput,
    ) -> Result<TransferDraft, ServerError> {
        let contact = self.find_contact(&input.contact_id).await?;

        let amount = Money::parse(&input.amount)?;
        if amount.is_zero() {
            return Err(ServerError::BadRequest(
                "金額はゼロ以外である必要があります".to_string(),
            ));
        }
        let memo = Memo::optional(input.memo)?;

        Ok(TransferDraft {
            id: TransferId::new(),
            contact,
            amount,
            memo,
        })
    }

    /// 送金記録を登録し、通知メールを送信する
    pub async fn record_transfer(
        &self,
        input: RecordTransferInput,
    ) -> Result<RecordTransferOutput, ServerError> {
        let draft = self.prepare_transfer(input).await?;
        self.record_draft(draft).await
    }

    /// 検証済みの送金内容を記録し、通知メールを送信する
    #[tracing::instrument(skip_all, fields(contact_id = %draft.contact.id()))]
    pub async fn record_draft(
        &self,
        draft: TransferDraft,
    ) -> Result<RecordTransferOutput, ServerError> {
        let TransferDraft {
            id,
            contact,
            amount,
            memo,
        } = draft;

        let transfer = Transfer::new(
            id,
            contact.id().clone(),
            amount,
            memo,
            ReferenceNumber::generate(),
            self.clock.now(),
        )?;

        // 確認後に連絡先が削除された場合は外部キー違反になる
        self.transfer_repository
            .insert(&transfer)
            .await
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    contact_not_found(contact.id())
                } else if e
                    .as_conflict()
                    .is_some_and(|(entity, _)| entity == "transfers_pkey")
                {
                    ServerError::Conflict("この送金は既に記録されています".to_string())
                } else {
                    ServerError::from(e)
                }
            })?;

        log_business_event!(
            event.category = event::category::TRANSFER,
            event.action = event::action::TRANSFER_RECORDED,
            event.entity_type = event::entity_type::TRANSFER,
            event.entity_id = %transfer.id(),
            event.result = event::result::SUCCESS,
            transfer.contact_id = %contact.id(),
            transfer.amount_cents = transfer.amount().cents(),
            transfer.reference_number = %transfer.reference_number(),
            "送金を記録しました"
        );

        let notification = match self
            .notification_service
            .send_transfer_notification(&contact, &transfer)
            .await
        {
            Ok(()) => NotificationOutcome::Sent,
            Err(e) => NotificationOutcome::Failed {
                kind:    e.kind(),
                message: e.to_string(),
            },
        };

        Ok(RecordTransferOutput {
            contact,
            transfer,
            notification,
        })
    }

    /// 連絡先の送金記録を時系列順で取得する
    pub async fn list_transfers(&self, contact_id: &ContactId) -> Result<Vec<Transfer>, ServerError> {
        self.find_contact(contact_id).await?;
        Ok(self.transfer_repository.find_by_contact(contact_id).await?)
    }

    /// 直近 `days` 日の送金記録を新しい順に最大 `limit` 件取得する
    pub async fn list_recent_transfers(
        &self,
        days: i64,
        limit: i64,
    ) -> Result<Vec<RecentTransfer>, ServerError> {
        if !(1..=MAX_RECENT_DAYS).contains(&days) {
            return Err(ServerError::BadRequest(format!(
                "days は 1〜{MAX_RECENT_DAYS} で指定してください"
            )));
        }
        if !(1..=MAX_RECENT_LIMIT).contains(&limit) {
            return Err(ServerError::BadRequest(format!(
                "limit は 1〜{MAX_RECENT_LIMIT} で指定してください"
            )));
        }

        let since = self.clock.now() - Duration::days(days);
        Ok(self.transfer_repository.find_recent(since, limit).await?)
    }

    async fn find_contact(&self, contact_id: &ContactId) -> Result<Contact, ServerError> {
        self.contact_repository
            .find_by_id(contact_id)
            .await?
            .ok_or_else(|| contact_not_found(contact_id))
    }
}
