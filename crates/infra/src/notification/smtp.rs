//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//!
//! 送信ごとにトランスポートを組み立て、接続・認証・送信を行う。
//! lettre の `pool` feature は無効にしているため、接続は送信の終了時（成功・失敗とも）に閉じられる。
//!
//! | `use_tls` | 接続方式 |
//! |-----------|---------|
//! | `true` | 平文で接続して STARTTLS に昇格（既定、ポート 587） |
//! | `false` | 接続時から TLS（implicit TLS、ポート 465） |

use std::time::Duration;

use async_trait::async_trait;
use etransfer_domain::notification::{EmailMessage, NotificationError};
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::Deserialize;

use super::NotificationSender;

/// SMTP 接続設定
///
/// 既定値 → 設定ファイル → `SMTP_*` 環境変数の順に上書きして組み立てる（server 側の config）。
/// 送信元アドレスとパスワードは必須だが、欠けていても起動は妨げず、送信時に
/// `NotificationError::Configuration` を返す。
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    /// 送信元メールアドレス（SMTP 認証のユーザー名を兼ねる）
    pub sender_email:    Option<String>,
    /// SMTP 認証のパスワード
    pub sender_password: Option<String>,
    /// 送信元の表示名
    pub sender_name:     String,
    /// SMTP サーバーのホスト名
    pub server:          String,
    /// SMTP サーバーのポート番号
    pub port:            u16,
    /// STARTTLS を使うか（`false` なら implicit TLS）
    pub use_tls:         bool,
    /// 接続・応答待ちのタイムアウト秒数
    pub timeout_secs:    u64,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            sender_email:    None,
            sender_password: None,
            sender_name:     "Interac e-Transfer".to_string(),
            server:          "smtp.gmail.com".to_string(),
            port:            587,
            use_tls:         true,
            timeout_secs:    30,
        }
    }
}

// パスワードをログに出さない
impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("sender_email", &self.sender_email)
            .field(
                "sender_password",
                &self.sender_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sender_name", &self.sender_name)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SmtpSettings {
    /// 送信元アドレスとパスワードを取り出す
    ///
    /// どちらかが未設定（または空文字列）なら `NotificationError::Configuration`。
    pub fn credentials(&self) -> Result<(&str, &str), NotificationError> {
        let email = self
            .sender_email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NotificationError::Configuration(
                    "送信元メールアドレス（SMTP_SENDER_EMAIL）が設定されていません".to_string(),
                )
            })?;
        let password = self
            .sender_password
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NotificationError::Configuration(
                    "SMTP パスワード（SMTP_SENDER_PASSWORD）が設定されていません".to_string(),
                )
            })?;

        Ok((email, password))
    }

    /// 送信に必要な設定が揃っているか
    pub fn is_complete(&self) -> bool {
        self.credentials().is_ok()
    }
}

/// SMTP 通知送信
pub struct SmtpNotificationSender {
    settings: SmtpSettings,
}

impl SmtpNotificationSender {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn build_message(
        &self,
        sender_email: &str,
        email: &EmailMessage,
    ) -> Result<Message, NotificationError> {
        let from = Mailbox::new(
            Some(self.settings.sender_name.clone()),
            sender_email.parse().map_err(|e| {
                NotificationError::Configuration(format!("送信元アドレス不正: {e}"))
            })?,
        );
        let to = Mailbox::new(
            email.to_name.clone(),
            email
                .to
                .parse()
                .map_err(|e| NotificationError::Delivery(format!("宛先アドレス不正: {e}")))?,
        );

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| NotificationError::Delivery(format!("メッセージ構築失敗: {e}")))
    }

    fn build_transport(
        &self,
        sender_email: &str,
        sender_password: &str,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let builder = if self.settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.server)
        }
        .map_err(|e| NotificationError::Configuration(format!("SMTP サーバー設定不正: {e}")))?;

        Ok(builder
            .port(self.settings.port)
            .credentials(Credentials::new(
                sender_email.to_string(),
                sender_password.to_string(),
            ))
            .timeout(Some(Duration::from_secs(self.settings.timeout_secs)))
            .build())
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    #[tracing::instrument(skip_all, fields(server = %self.settings.server, port = self.settings.port))]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        // 接続前に設定不足を検出する
        let (sender_email, sender_password) = self.settings.credentials()?;

        let message = self.build_message(sender_email, email)?;
        let transport = self.build_transport(sender_email, sender_password)?;

        transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Delivery(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_email() -> EmailMessage {
        EmailMessage {
            to:        "alice@example.com".to_string(),
            to_name:   Some("Alice".to_string()),
            subject:   "Interac e-Transfer: You've received $50.00 from Bank and it has been automatically deposited.".to_string(),
            html_body: "<p>deposit</p>".to_string(),
            text_body: "deposit".to_string(),
        }
    }

    /// 接続を拒否するローカルポートに向けた設定
    fn unreachable_settings(use_tls: bool) -> SmtpSettings {
        SmtpSettings {
            sender_email: Some("bank@example.com".to_string()),
            sender_password: Some("app-password".to_string()),
            server: "localhost".to_string(),
            port: 1,
            use_tls,
            timeout_secs: 2,
            ..SmtpSettings::default()
        }
    }

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpNotificationSender>();
    }

    #[test]
    fn test_既定値はgmailのstarttls() {
        let settings = SmtpSettings::default();

        assert_eq!(settings.server, "smtp.gmail.com");
        assert_eq!(settings.port, 587);
        assert!(settings.use_tls);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.sender_name, "Interac e-Transfer");
        assert!(!settings.is_complete());
    }

    #[test]
    fn test_debug出力にパスワードを含まない() {
        let settings = unreachable_settings(true);

        let debug = format!("{settings:?}");

        assert!(!debug.contains("app-password"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_送信元アドレス未設定なら接続前にconfigurationエラー() {
        let sender = SmtpNotificationSender::new(SmtpSettings {
            sender_email: None,
            ..unreachable_settings(true)
        });

        let result = sender.send_email(&make_email()).await;

        assert!(matches!(result, Err(NotificationError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_パスワードが空文字列なら接続前にconfigurationエラー() {
        let sender = SmtpNotificationSender::new(SmtpSettings {
            sender_password: Some(String::new()),
            ..unreachable_settings(true)
        });

        let result = sender.send_email(&make_email()).await;

        assert!(matches!(result, Err(NotificationError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_接続できないサーバーへのstarttls送信はdeliveryエラー() {
        let sender = SmtpNotificationSender::new(unreachable_settings(true));

        let result = sender.send_email(&make_email()).await;

        assert!(matches!(result, Err(NotificationError::Delivery(_))));
    }

    #[tokio::test]
    async fn test_接続できないサーバーへのimplicit_tls送信はdeliveryエラー() {
        let sender = SmtpNotificationSender::new(unreachable_settings(false));

        let result = sender.send_email(&make_email()).await;

        assert!(matches!(result, Err(NotificationError::Delivery(_))));
    }

    #[test]
    fn test_送信元の表示名と宛先名がヘッダーに入る() {
        let sender = SmtpNotificationSender::new(SmtpSettings {
            sender_name: "Northside Bank".to_string(),
            ..unreachable_settings(true)
        });

        let message = sender
            .build_message("bank@example.com", &make_email())
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("From: \"Northside Bank\" <bank@example.com>"));
        assert!(formatted.contains("To: Alice <alice@example.com>"));
    }
}
