//! # インフラ層エラー定義
//!
//! データベースとの通信で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターン:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Database, Conflict 等）
//!
//! `From<sqlx::Error>` では PostgreSQL の制約違反を判別し、
//! 一意制約違反は [`InfraErrorKind::Conflict`]、外部キー違反は
//! [`InfraErrorKind::ForeignKey`] に変換する。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別と [`SpanTrace`]（呼び出し経路）を保持する。
/// `From<sqlx::Error>` やコンストラクタでエラーを生成した時点のスパン情報が記録される。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// SQL クエリの実行失敗、接続エラーなど。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// 一意制約違反
    ///
    /// 同じメールアドレスの連絡先、同じ参照番号の送金記録を挿入しようとした場合。
    #[error("競合が発生しました: {entity}(id={id})")]
    Conflict {
        /// 制約名またはエンティティ名（例: "contacts_email_key"）
        entity: String,
        /// 競合した値・ID
        id:     String,
    },

    /// 外部キー制約違反
    ///
    /// 存在しない連絡先への送金記録の挿入、送金記録が残る連絡先の削除など。
    #[error("参照制約違反: {constraint}")]
    ForeignKey {
        /// 制約名（例: "transfers_contact_id_fkey"）
        constraint: String,
    },

    /// 予期しないエラー
    ///
    /// DB に格納された値がドメインの制約を満たさない場合など。
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Conflict バリアントの場合、entity と id を返す
    pub fn as_conflict(&self) -> Option<(&str, &str)> {
        match &self.kind {
            InfraErrorKind::Conflict { entity, id } => Some((entity, id)),
            _ => None,
        }
    }

    /// 外部キー制約違反か
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.kind, InfraErrorKind::ForeignKey { .. })
    }

    // ===== Convenience constructors =====

    /// 一意制約違反エラーを生成する
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Conflict {
            entity: entity.into(),
            id:     id.into(),
        })
    }

    /// 外部キー制約違反エラーを生成する
    pub fn foreign_key(constraint: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::ForeignKey {
            constraint: constraint.into(),
        })
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Unexpected(msg.into()))
    }

    fn from_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &source {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return Self::conflict(constraint, db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return Self::foreign_key(constraint);
            }
        }

        Self::from_kind(InfraErrorKind::Database(source))
    }
}
