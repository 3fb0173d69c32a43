//! # e-Transfer Notify インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プールとマイグレーション
//! - **リポジトリ実装**: 連絡先・送金記録の永続化（台帳）
//! - **通知送信**: SMTP によるメール送信
//!
//! ## 依存関係
//!
//! ```text
//! server → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use etransfer_infra::{db, repository::PostgresContactRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/interac_transfers").await?;
//!     db::run_migrations(&pool).await?;
//!
//!     let contacts = PostgresContactRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
