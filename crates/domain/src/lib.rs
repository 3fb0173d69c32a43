//! # e-Transfer ドメイン層
//!
//! 連絡先（Contact）と送金記録（Transfer）を中心としたドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（Contact, Transfer）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（Money, Email,
//!   ReferenceNumber）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! server → infra → domain
//!    ↘               ↑
//!      shared ───────┘ (依存しない)
//! ```
//!
//! ドメイン層はインフラ層（DB、SMTP）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`contact`] - 連絡先エンティティ
//! - [`transfer`] - 送金記録エンティティと残高
//! - [`money`] - 金額（セント単位の整数）
//! - [`notification`] - 通知メールのドメイン型
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー
//!
//! ## 使用例
//!
//! ```rust
//! use etransfer_domain::{DomainError, contact::ContactId};
//!
//! let contact_id = ContactId::new();
//!
//! let error = DomainError::NotFound {
//!     entity_type: "Contact",
//!     id:          contact_id.to_string(),
//! };
//! assert!(error.to_string().contains("Contact"));
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod contact;
pub mod error;
pub mod money;
pub mod notification;
pub mod transfer;

pub use error::DomainError;
