//! # 送金ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/contacts/{contact_id}/transfers` - 連絡先の送金履歴（時系列順）
//! - `POST /api/v1/contacts/{contact_id}/transfers` - 送金記録 + 通知メール送信
//! - `GET /api/v1/transfers?days=&limit=` - 最近の送金記録（新しい順）
//!
//! 送金記録の登録は行が保存されれば常に `201 Created` を返す。
//! 通知メールの成否はレスポンスの `notification` に含める。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use etransfer_domain::{contact::ContactId, money::Money, transfer::Transfer};
use etransfer_infra::repository::RecentTransfer;
use etransfer_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::ContactDto;
use crate::{
    error::ServerError,
    usecase::transfer::{
        DEFAULT_RECENT_DAYS,
        DEFAULT_RECENT_LIMIT,
        NotificationOutcome,
        RecordTransferInput,
        RecordTransferOutput,
        TransferUseCaseImpl,
    },
};

/// 送金 API の共有状態
pub struct TransferState {
    pub usecase: Arc<TransferUseCaseImpl>,
}

// --- リクエスト/レスポンス型 ---

/// 金額の入力（`"50.00"` 形式の文字列、または JSON の数値）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// 送金記録リクエスト
#[derive(Debug, Deserialize)]
pub struct RecordTransferRequest {
    pub amount: AmountInput,
    pub memo:   Option<String>,
}

/// 最近の送金記録のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct RecentTransfersQuery {
    pub days:  Option<i64>,
    pub limit: Option<i64>,
}

/// 金額 DTO
///
/// `cents` は符号付きのセント数、`formatted` は `"-$1,234.56"` 形式。
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MoneyDto {
    pub cents:     i64,
    pub formatted: String,
}

impl From<Money> for MoneyDto {
    fn from(money: Money) -> Self {
        Self {
            cents:     money.cents(),
            formatted: money.to_string(),
        }
    }
}

/// 送金記録 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TransferDto {
    pub id:               Uuid,
    pub contact_id:       Uuid,
    pub amount:           MoneyDto,
    pub memo:             Option<String>,
    pub reference_number: String,
    pub status:           String,
    pub created_at:       String,
}

impl From<&Transfer> for TransferDto {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id:               *transfer.id().as_uuid(),
            contact_id:       *transfer.contact_id().as_uuid(),
            amount:           MoneyDto::from(transfer.amount()),
            memo:             transfer.memo().map(|m| m.to_string()),
            reference_number: transfer.reference_number().as_str().to_string(),
            status:           transfer.status().to_string(),
            created_at:       transfer.created_at().to_rfc3339(),
        }
    }
}

/// 連絡先名付きの送金記録 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecentTransferDto {
    #[serde(flatten)]
    pub transfer:      TransferDto,
    pub contact_name:  String,
    pub contact_email: String,
}

impl From<&RecentTransfer> for RecentTransferDto {
    fn from(recent: &RecentTransfer) -> Self {
        Self {
            transfer:      TransferDto::from(&recent.transfer),
            contact_name:  recent.contact_name.clone(),
            contact_email: recent.contact_email.clone(),
        }
    }
}

/// 通知結果 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationDto {
    /// `"sent"` または `"failed"`
    pub status:     String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:      Option<String>,
}

impl From<&NotificationOutcome> for NotificationDto {
    fn from(outcome: &NotificationOutcome) -> Self {
        match outcome {
            NotificationOutcome::Sent => Self {
                status:     "sent".to_string(),
                error_kind: None,
                error:      None,
            },
            NotificationOutcome::Failed { kind, message } => Self {
                status:     "failed".to_string(),
                error_kind: Some((*kind).to_string()),
                error:      Some(message.clone()),
            },
        }
    }
}

/// 送金記録の登録結果 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RecordedTransferDto {
    pub contact:      ContactDto,
    pub transfer:     TransferDto,
    pub notification: NotificationDto,
}

impl From<&RecordTransferOutput> for RecordedTransferDto {
    fn from(output: &RecordTransferOutput) -> Self {
        Self {
            contact:      ContactDto::from(&output.contact),
            transfer:     TransferDto::from(&output.transfer),
            notification: NotificationDto::from(&output.notification),
        }
    }
}

// --- ハンドラ ---

/// GET /api/v1/contacts/{contact_id}/transfers
#[tracing::instrument(skip_all, fields(%contact_id))]
pub async fn list_transfers(
    State(state): State<Arc<TransferState>>,
    Path(contact_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let transfers = state
        .usecase
        .list_transfers(&ContactId::from_uuid(contact_id))
        .await?;

    let items: Vec<TransferDto> = transfers.iter().map(TransferDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/v1/contacts/{contact_id}/transfers
///
/// ## レスポンス
///
/// - `201 Created`: 送金記録を保存（通知の成否は `notification` を参照）
/// - `400 Bad Request`: 金額・メモが不正
/// - `404 Not Found`: 連絡先が見つからない
#[tracing::instrument(skip_all, fields(%contact_id))]
pub async fn record_transfer(
    State(state): State<Arc<TransferState>>,
    Path(contact_id): Path<Uuid>,
    Json(req): Json<RecordTransferRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let output = state
        .usecase
        .record_transfer(RecordTransferInput {
            contact_id: ContactId::from_uuid(contact_id),
            amount:     req.amount.into_text(),
            memo:       req.memo,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(RecordedTransferDto::from(&output))),
    ))
}

/// GET /api/v1/transfers
///
/// 直近 `days` 日（既定 30）の送金記録を新しい順に最大 `limit` 件（既定 100）返す。
#[tracing::instrument(skip_all)]
pub async fn list_recent_transfers(
    State(state): State<Arc<TransferState>>,
    Query(query): Query<RecentTransfersQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let recent = state
        .usecase
        .list_recent_transfers(
            query.days.unwrap_or(DEFAULT_RECENT_DAYS),
            query.limit.unwrap_or(DEFAULT_RECENT_LIMIT),
        )
        .await?;

    let items: Vec<RecentTransferDto> = recent.iter().map(RecentTransferDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
        routing::get,
    };
    use chrono::{DateTime, Duration, Utc};
    use etransfer_domain::{
        clock::FixedClock,
        contact::{Contact, ContactName, Email},
    };
    use etransfer_infra::{
        mock::{FailingNotificationSender, MockLedger, MockNotificationSender},
        notification::NotificationSender,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tower::ServiceExt;

    use super::*;
    use crate::usecase::notification::{NotificationService, TemplateRenderer};

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn create_test_app(
        ledger: &MockLedger,
        sender: Arc<dyn NotificationSender>,
        clock: Arc<FixedClock>,
    ) -> Router {
        let usecase = TransferUseCaseImpl::new(
            Arc::new(ledger.contact_repository()),
            Arc::new(ledger.transfer_repository()),
            Arc::new(NotificationService::new(
                sender,
                TemplateRenderer::new().unwrap(),
                "Northside Bank",
            )),
            clock,
        );
        let state = Arc::new(TransferState {
            usecase: Arc::new(usecase),
        });

        Router::new()
            .route(
                "/api/v1/contacts/{contact_id}/transfers",
                get(list_transfers).post(record_transfer),
            )
            .route("/api/v1/transfers", get(list_recent_transfers))
            .with_state(state)
    }

    fn add_alice(ledger: &MockLedger) -> Contact {
        let contact = Contact::new(
            ContactId::new(),
            ContactName::new("Alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            fixed_now(),
        );
        ledger.add_contact(contact.clone());
        contact
    }

    fn record_request(contact_id: &Uuid, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/contacts/{contact_id}/transfers"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn response_body<T: serde::de::DeserializeOwned>(
        response: axum::http::Response<Body>,
    ) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(serde_json::json!("50.00"))]
    #[case(serde_json::json!(50))]
    #[case(serde_json::json!("$50"))]
    #[tokio::test]
    async fn test_post_送金を記録すると201で通知結果sentが返る(#[case] amount: serde_json::Value) {
        let ledger = MockLedger::new();
        let alice = add_alice(&ledger);
        let sender = MockNotificationSender::new();
        let sut = create_test_app(
            &ledger,
            Arc::new(sender.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );

        let response = sut
            .oneshot(record_request(
                alice.id().as_uuid(),
                serde_json::json!({ "amount": amount, "memo": "Rent" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: ApiResponse<RecordedTransferDto> = response_body(response).await;
        assert_eq!(body.data.transfer.amount.cents, 5000);
        assert_eq!(body.data.transfer.amount.formatted, "$50.00");
        assert_eq!(body.data.transfer.memo.as_deref(), Some("Rent"));
        assert_eq!(body.data.transfer.status, "completed");
        assert_eq!(body.data.notification.status, "sent");
        assert_eq!(body.data.contact.name, "Alice");
        assert_eq!(ledger.transfer_count(), 1);
        assert_eq!(sender.sent_emails().len(), 1);
    }

    #[tokio::test]
    async fn test_post_通知失敗でも201で通知結果failedが返る() {
        let ledger = MockLedger::new();
        let alice = add_alice(&ledger);
        let sut = create_test_app(
            &ledger,
            Arc::new(FailingNotificationSender::delivery()),
            Arc::new(FixedClock::new(fixed_now())),
        );

        let response = sut
            .oneshot(record_request(
                alice.id().as_uuid(),
                serde_json::json!({ "amount": "-20" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: ApiResponse<RecordedTransferDto> = response_body(response).await;
        assert_eq!(body.data.notification.status, "failed");
        assert_eq!(body.data.notification.error_kind.as_deref(), Some("delivery"));
        assert!(body.data.notification.error.is_some());
        assert_eq!(ledger.transfer_count(), 1);
    }

    #[tokio::test]
    async fn test_post_存在しない連絡先は404で書き込まない() {
        let ledger = MockLedger::new();
        let sut = create_test_app(
            &ledger,
            Arc::new(MockNotificationSender::new()),
            Arc::new(FixedClock::new(fixed_now())),
        );

        let response = sut
            .oneshot(record_request(
                &Uuid::now_v7(),
                serde_json::json!({ "amount": "50" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(ledger.transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_post_不正な金額は400が返る() {
        let ledger = MockLedger::new();
        let alice = add_alice(&ledger);
        let sut = create_test_app(
            &ledger,
            Arc::new(MockNotificationSender::new()),
            Arc::new(FixedClock::new(fixed_now())),
        );

        let response = sut
            .oneshot(record_request(
                alice.id().as_uuid(),
                serde_json::json!({ "amount": "12.345" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ledger.transfer_count(), 0);
    }

    #[tokio::test]
    async fn test_get_送金履歴は時系列順で返る() {
        let ledger = MockLedger::new();
        let alice = add_alice(&ledger);
        let clock = Arc::new(FixedClock::new(fixed_now()));
        let sut = create_test_app(&ledger, Arc::new(MockNotificationSender::new()), clock.clone());
        for amount in ["50", "-20", "10"] {
            let response = sut
                .clone()
                .oneshot(record_request(
                    alice.id().as_uuid(),
                    serde_json::json!({ "amount": amount }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            clock.advance(Duration::seconds(1));
        }

        let response = sut
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/contacts/{}/transfers", alice.id().as_uuid()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<Vec<TransferDto>> = response_body(response).await;
        let cents: Vec<i64> = body.data.iter().map(|t| t.amount.cents).collect();
        assert_eq!(cents, vec![5000, -2000, 1000]);
    }

    #[tokio::test]
    async fn test_get_最近の送金記録は新しい順で連絡先名を含む() {
        let ledger = MockLedger::new();
        let alice = add_alice(&ledger);
        let clock = Arc::new(FixedClock::new(fixed_now()));
        let sut = create_test_app(&ledger, Arc::new(MockNotificationSender::new()), clock.clone());
        for amount in ["10", "20"] {
            sut.clone()
                .oneshot(record_request(
                    alice.id().as_uuid(),
                    serde_json::json!({ "amount": amount }),
                ))
                .await
                .unwrap();
            clock.advance(Duration::seconds(1));
        }

        let response = sut
            .oneshot(
                Request::builder()
                    .uri("/api/v1/transfers?days=7&limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<Vec<RecentTransferDto>> = response_body(response).await;
        let cents: Vec<i64> = body.data.iter().map(|t| t.transfer.amount.cents).collect();
        assert_eq!(cents, vec![2000, 1000]);
        assert_eq!(body.data[0].contact_name, "Alice");
        assert_eq!(body.data[0].contact_email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_get_最近の送金記録で範囲外のdaysは400が返る() {
        let ledger = MockLedger::new();
        let sut = create_test_app(
            &ledger,
            Arc::new(MockNotificationSender::new()),
            Arc::new(FixedClock::new(fixed_now())),
        );

        let response = sut
            .oneshot(
                Request::builder()
                    .uri("/api/v1/transfers?days=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
