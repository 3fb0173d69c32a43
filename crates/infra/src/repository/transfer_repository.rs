//! # TransferRepository
//!
//! 送金記録の永続化と残高の集計を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記のみ**: 送金記録は挿入と参照だけを提供し、更新・削除は持たない
//! - **残高は集計**: `COALESCE(SUM(amount_cents), 0)` で都度計算する
//! - **時系列順**: 連絡先ごとの一覧は `created_at` 昇順、同時刻は `id`（UUID v7）順

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etransfer_domain::{
    contact::ContactId,
    money::Money,
    transfer::{Memo, ReferenceNumber, Transfer, TransferId, TransferStatus},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 連絡先名付きの送金記録（ダッシュボード表示用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTransfer {
    pub transfer:      Transfer,
    pub contact_name:  String,
    pub contact_email: String,
}

/// 送金記録リポジトリトレイト
#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// 送金記録を 1 行挿入する
    ///
    /// 参照先の連絡先が存在しない場合は外部キー違反エラーを返す。
    async fn insert(&self, transfer: &Transfer) -> Result<(), InfraError>;

    /// 連絡先の送金記録を時系列順で取得する
    async fn find_by_contact(&self, contact_id: &ContactId) -> Result<Vec<Transfer>, InfraError>;

    /// 連絡先の送金記録の合計（残高）を計算する
    ///
    /// 送金記録がなければゼロ。
    async fn sum_by_contact(&self, contact_id: &ContactId) -> Result<Money, InfraError>;

    /// `since` 以降の送金記録を新しい順に最大 `limit` 件取得する
    async fn find_recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentTransfer>, InfraError>;
}

/// PostgreSQL 実装の TransferRepository
#[derive(Debug, Clone)]
pub struct PostgresTransferRepository {
    pool: PgPool,
}

impl PostgresTransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TransferRow {
    id:               Uuid,
    contact_id:       Uuid,
    amount_cents:     i64,
    memo:             Option<String>,
    reference_number: String,
    status:           String,
    created_at:       DateTime<Utc>,
}

impl TryFrom<TransferRow> for Transfer {
    type Error = InfraError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        let memo = Memo::optional(row.memo)
            .map_err(|e| InfraError::unexpected(format!("transfers.memo が不正です: {e}")))?;
        let reference_number = ReferenceNumber::new(row.reference_number).map_err(|e| {
            InfraError::unexpected(format!("transfers.reference_number が不正です: {e}"))
        })?;
        let status: TransferStatus = row
            .status
            .parse()
            .map_err(|e| InfraError::unexpected(format!("transfers.status が不正です: {e}")))?;

        Ok(Transfer::from_db(
            TransferId::from_uuid(row.id),
            ContactId::from_uuid(row.contact_id),
            Money::from_cents(row.amount_cents),
            memo,
            reference_number,
            status,
            row.created_at,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct RecentTransferRow {
    #[sqlx(flatten)]
    transfer:      TransferRow,
    contact_name:  String,
    contact_email: String,
}

#[async_trait]
impl TransferRepository for PostgresTransferRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %transfer.id(), contact_id = %transfer.contact_id()))]
    async fn insert(&self, transfer: &Transfer) -> Result<(), InfraError> {
        let status: &'static str = transfer.status().into();

        sqlx::query(
            r#"
            INSERT INTO transfers (id, contact_id, amount_cents, memo, reference_number, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(transfer.id().as_uuid())
        .bind(transfer.contact_id().as_uuid())
        .bind(transfer.amount().cents())
        .bind(transfer.memo().map(Memo::as_str))
        .bind(transfer.reference_number().as_str())
        .bind(status)
        .bind(transfer.created_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%contact_id))]
    async fn find_by_contact(&self, contact_id: &ContactId) -> Result<Vec<Transfer>, InfraError> {
        let rows: Vec<TransferRow> = sqlx::query_as(
            r#"
            SELECT id, contact_id, amount_cents, memo, reference_number, status, created_at
            FROM transfers
            WHERE contact_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(contact_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transfer::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%contact_id))]
    async fn sum_by_contact(&self, contact_id: &ContactId) -> Result<Money, InfraError> {
        // SUM(BIGINT) は NUMERIC を返すため BIGINT にキャストする
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)::BIGINT
            FROM transfers
            WHERE contact_id = $1
            "#,
        )
        .bind(contact_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%since, limit))]
    async fn find_recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecentTransfer>, InfraError> {
        let rows: Vec<RecentTransferRow> = sqlx::query_as(
            r#"
            SELECT
                t.id, t.contact_id, t.amount_cents, t.memo, t.reference_number, t.status, t.created_at,
                c.name AS contact_name,
                c.email AS contact_email
            FROM transfers t
            JOIN contacts c ON c.id = t.contact_id
            WHERE t.created_at >= $1
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RecentTransfer {
                    transfer:      Transfer::try_from(row.transfer)?,
                    contact_name:  row.contact_name,
                    contact_email: row.contact_email,
                })
            })
            .collect()
    }
}
