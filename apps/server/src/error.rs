//! # サーバーエラー定義
//!
//! ユースケース・ハンドラで発生するエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | バリアント | ステータス |
//! |-----------|-----------|
//! | `NotFound` | 404 |
//! | `BadRequest` | 400 |
//! | `Conflict` | 409 |
//! | `Database` / `Internal` | 500（詳細はログのみ） |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use etransfer_domain::DomainError;
use etransfer_infra::InfraError;
use etransfer_shared::{
    ErrorResponse,
    event_log::error::{category, kind},
};
use thiserror::Error;

/// サーバーで発生するエラー
#[derive(Debug, Error)]
pub enum ServerError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト（入力値のバリデーション失敗を含む）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 競合（一意制約違反、参照中の連絡先の削除）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for ServerError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            DomainError::NotFound { entity_type, id } => {
                Self::NotFound(format!("{entity_type} が見つかりません: {id}"))
            }
            DomainError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

impl From<InfraError> for ServerError {
    /// 制約違反は 409、それ以外は 500 に分類する
    ///
    /// 制約ごとにメッセージを変えたい場合はユースケース側で先に判定する。
    fn from(err: InfraError) -> Self {
        if err.as_conflict().is_some() {
            return Self::Conflict("既に登録されている値です".to_string());
        }
        if err.is_foreign_key_violation() {
            return Self::Conflict("参照中のデータがあるため操作できません".to_string());
        }
        Self::Database(err)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::not_found(msg)),
            ServerError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::validation_error(msg),
            ),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::conflict(msg)),
            ServerError::Database(e) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::DATABASE,
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
            ServerError::Internal(msg) => {
                tracing::error!(
                    error.category = category::INFRASTRUCTURE,
                    error.kind = kind::INTERNAL,
                    "内部エラー: {}",
                    msg
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn into_parts(err: ServerError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case(ServerError::NotFound("連絡先が見つかりません".to_string()), StatusCode::NOT_FOUND)]
    #[case(ServerError::BadRequest("金額が不正です".to_string()), StatusCode::BAD_REQUEST)]
    #[case(ServerError::Conflict("登録済みです".to_string()), StatusCode::CONFLICT)]
    #[case(ServerError::Internal("panic".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[tokio::test]
    async fn test_エラー種別ごとのステータスコード(
        #[case] err: ServerError,
        #[case] expected: StatusCode,
    ) {
        let (status, body) = into_parts(err).await;

        assert_eq!(status, expected);
        assert_eq!(body.status, expected.as_u16());
    }

    #[tokio::test]
    async fn test_データベースエラーは詳細を返さない() {
        let err = ServerError::Database(InfraError::unexpected("connection refused by db-01"));

        let (status, body) = into_parts(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.detail, "内部エラーが発生しました");
    }

    #[test]
    fn test_一意制約違反はconflictになる() {
        let err: ServerError = InfraError::conflict("contacts_email_key", "dup").into();

        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[test]
    fn test_バリデーションエラーはbad_requestになる() {
        let err: ServerError = DomainError::Validation("金額が不正です".to_string()).into();

        assert!(matches!(err, ServerError::BadRequest(msg) if msg == "金額が不正です"));
    }
}
