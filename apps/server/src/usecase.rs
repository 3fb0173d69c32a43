//! # ユースケース層
//!
//! ハンドラから呼ばれるアプリケーションロジック。
//! リポジトリ・通知送信は trait 経由で受け取り、テストではモックに差し替える。

pub mod contact;
pub mod notification;
pub mod transfer;

pub use contact::{ContactUseCaseImpl, CreateContactInput, UpdateContactInput};
pub use notification::{NotificationService, TemplateRenderer};
pub use transfer::{
    NotificationOutcome,
    RecordTransferInput,
    RecordTransferOutput,
    TransferDraft,
    TransferUseCaseImpl,
};
