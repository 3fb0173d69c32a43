//! # 通知サービス
//!
//! テンプレートレンダリング → メール送信 → ビジネスイベントログを統合するサービス。
//!
//! - 送信は 1 回のみ行い、再送しない
//! - 成否は `Result` で呼び出し元に返す。送金記録の取り消しは呼び出し元も行わない
//! - `NotificationSender` は trait で抽象化し、SMTP / Noop / モックを差し替える

use std::sync::Arc;

use etransfer_domain::{
    contact::Contact,
    notification::{NotificationError, TransferNotification},
    transfer::Transfer,
};
use etransfer_infra::notification::NotificationSender;
use etransfer_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::TemplateRenderer;

/// 通知サービス
pub struct NotificationService {
    sender:            Arc<dyn NotificationSender>,
    template_renderer: TemplateRenderer,
    sender_name:       String,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        template_renderer: TemplateRenderer,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            template_renderer,
            sender_name: sender_name.into(),
        }
    }

    /// 送金記録の通知メールを連絡先へ送信する
    #[tracing::instrument(skip_all, fields(transfer_id = %transfer.id()))]
    pub async fn send_transfer_notification(
        &self,
        contact: &Contact,
        transfer: &Transfer,
    ) -> Result<(), NotificationError> {
        let notification = TransferNotification::new(contact, transfer);
        let direction: &'static str = notification.direction().into();

        let result = match self
            .template_renderer
            .render(&notification, &self.sender_name)
        {
            Ok(email) => self.sender.send_email(&email).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::TRANSFER,
                    event.entity_id = %transfer.id(),
                    event.result = event::result::SUCCESS,
                    notification.direction = direction,
                    notification.recipient = %contact.email(),
                    "通知メール送信成功"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::TRANSFER,
                    event.entity_id = %transfer.id(),
                    event.result = event::result::FAILURE,
                    notification.direction = direction,
                    notification.recipient = %contact.email(),
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = e.kind(),
                    error = %e,
                    "通知メール送信失敗"
                );
            }
        }

        result
    }
}
