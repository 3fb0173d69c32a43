//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで送金通知メールを HTML/plaintext 両形式で生成する。
//!
//! - テンプレートは `include_str!` でバイナリに埋め込む
//! - HTML テンプレートは tera の自動エスケープ対象（拡張子 `.html`）
//! - 受取人名は大文字で表示する
//!
//! ## 件名
//!
//! | 向き | 件名 |
//! |------|------|
//! | 入金 | `Interac e-Transfer: You've received {amount} from {sender_name} and it has been automatically deposited.` |
//! | 出金 | `Interac e-Transfer: {amount} has been withdrawn by {sender_name}.` |

use chrono::{DateTime, Utc};
use etransfer_domain::notification::{
    EmailMessage,
    NotificationError,
    TransferDirection,
    TransferNotification,
};
use tera::{Context, Tera};

const TEMPLATE_HTML: &str = "transfer.html";
const TEMPLATE_TEXT: &str = "transfer.txt";

/// テンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 埋め込みテンプレートを登録したレンダラーを作成する
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    TEMPLATE_HTML,
                    include_str!("../../../templates/notifications/transfer.html"),
                ),
                (
                    TEMPLATE_TEXT,
                    include_str!("../../../templates/notifications/transfer.txt"),
                ),
            ])
            .map_err(|e| NotificationError::Template(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 送金通知からメールメッセージを生成する
    ///
    /// `sender_name` は送信元の表示名（SMTP 設定の `sender_name`）。
    pub fn render(
        &self,
        notification: &TransferNotification,
        sender_name: &str,
    ) -> Result<EmailMessage, NotificationError> {
        let direction = notification.direction();
        // 向きは件名と本文で表すため、金額は絶対値で表示する
        let amount = notification.amount.abs().to_string();

        let mut context = Context::new();
        context.insert("recipient_name", &notification.recipient_name.to_uppercase());
        context.insert("sender_name", sender_name);
        context.insert("amount", &amount);
        context.insert("is_credit", &(direction == TransferDirection::Credit));
        context.insert("reference_number", &notification.reference_number);
        context.insert("transfer_date", &format_transfer_date(notification.recorded_at));
        context.insert("memo", &notification.memo);

        let html_body = self
            .engine
            .render(TEMPLATE_HTML, &context)
            .map_err(|e| NotificationError::Template(e.to_string()))?;
        let text_body = self
            .engine
            .render(TEMPLATE_TEXT, &context)
            .map_err(|e| NotificationError::Template(e.to_string()))?;

        let subject = match direction {
            TransferDirection::Credit => format!(
                "Interac e-Transfer: You've received {amount} from {sender_name} and it has been automatically deposited."
            ),
            TransferDirection::Debit => {
                format!("Interac e-Transfer: {amount} has been withdrawn by {sender_name}.")
            }
        };

        Ok(EmailMessage {
            to: notification.recipient_email.clone(),
            to_name: Some(notification.recipient_name.clone()),
            subject,
            html_body,
            text_body,
        })
    }
}

/// 通知メールの日時表記（例: `OCTOBER 14, 2026 at 9:05`、UTC）
fn format_transfer_date(at: DateTime<Utc>) -> String {
    format!(
        "{} at {}",
        at.format("%B %-d, %Y").to_string().to_uppercase(),
        at.format("%-H:%M")
    )
}
