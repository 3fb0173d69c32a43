//! # ContactRepository
//!
//! 連絡先の永続化を担当するリポジトリ。
//!
//! - メールアドレスの一意性は `contacts_email_key` 制約で保証し、違反は
//!   [`InfraErrorKind::Conflict`](crate::error::InfraErrorKind::Conflict) になる
//! - 送金記録が残る連絡先の削除は外部キー（`ON DELETE RESTRICT`）で拒否される

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etransfer_domain::contact::{Contact, ContactId, ContactName, Email};
use sqlx::PgPool;
use uuid::Uuid;

use super::escape_like;
use crate::error::InfraError;

/// 連絡先リポジトリトレイト
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// 連絡先を名前順で取得する
    ///
    /// `search` を指定した場合は名前またはメールアドレスの部分一致（大文字小文字を区別しない）
    /// で絞り込む。
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<Contact>, InfraError>;

    /// ID で連絡先を検索する
    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, InfraError>;

    /// 連絡先を挿入する
    async fn insert(&self, contact: &Contact) -> Result<(), InfraError>;

    /// 連絡先の名前・メールアドレスを更新する
    async fn update(&self, contact: &Contact) -> Result<(), InfraError>;

    /// 連絡先を削除する
    ///
    /// 削除した場合は `true`、該当する連絡先がなければ `false` を返す。
    async fn delete(&self, id: &ContactId) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の ContactRepository
#[derive(Debug, Clone)]
pub struct PostgresContactRepository {
    pool: PgPool,
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id:         Uuid,
    name:       String,
    email:      String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = InfraError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        // DB の制約とドメインの制約がずれている場合のみ失敗する
        let name = ContactName::new(row.name)
            .map_err(|e| InfraError::unexpected(format!("contacts.name が不正です: {e}")))?;
        let email = Email::new(row.email)
            .map_err(|e| InfraError::unexpected(format!("contacts.email が不正です: {e}")))?;

        Ok(Contact::from_db(
            ContactId::from_uuid(row.id),
            name,
            email,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(search = ?search))]
    async fn find_all(&self, search: Option<&str>) -> Result<Vec<Contact>, InfraError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM contacts
            WHERE $1::TEXT IS NULL
               OR name ILIKE $1 ESCAPE '\'
               OR email ILIKE $1 ESCAPE '\'
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &ContactId) -> Result<Option<Contact>, InfraError> {
        let row: Option<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contact::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %contact.id()))]
    async fn insert(&self, contact: &Contact) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(contact.id().as_uuid())
        .bind(contact.name().as_str())
        .bind(contact.email().as_str())
        .bind(contact.created_at())
        .bind(contact.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %contact.id()))]
    async fn update(&self, contact: &Contact) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            UPDATE contacts
            SET name = $2, email = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(contact.id().as_uuid())
        .bind(contact.name().as_str())
        .bind(contact.email().as_str())
        .bind(contact.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &ContactId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PostgresContactRepository>();
    }

    #[test]
    fn test_不正なメールアドレスの行はunexpectedエラーになる() {
        let row = ContactRow {
            id:         Uuid::now_v7(),
            name:       "Alice".to_string(),
            email:      "not-an-email".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let result = Contact::try_from(row);

        assert!(matches!(
            result.map_err(|e| e.to_string()),
            Err(msg) if msg.contains("contacts.email")
        ));
    }
}
