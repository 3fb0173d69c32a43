//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・開発）、Noop（ログ出力のみ）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **単発送信**: 再送は行わない。失敗は [`NotificationError`] として呼び出し元に返す

mod noop;
mod smtp;

use async_trait::async_trait;
use etransfer_domain::notification::{EmailMessage, NotificationError};
pub use noop::NoopNotificationSender;
pub use smtp::{SmtpNotificationSender, SmtpSettings};

/// メール送信トレイト
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを 1 通送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
