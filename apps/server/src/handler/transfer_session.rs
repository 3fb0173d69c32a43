//! # 送金セッションハンドラ
//!
//! 送金の入力 → 確認 → 確定の多段フローを署名付き Cookie で扱う。
//! Cookie には未記録の下書き（下書き ID・連絡先 ID・金額・メモ）のみを保存し、
//! サーバー側には状態を持たない。下書き ID は記録時の送金 ID になるため、
//! 古い Cookie で確定を繰り返しても 409 となり二重に記録されない。
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/transfer-session` - 下書きを検証して Cookie に保存、確認内容を返す
//! - `GET /api/v1/transfer-session` - 下書きの確認内容を返す
//! - `POST /api/v1/transfer-session/confirm` - 下書きを記録して通知、Cookie を削除
//! - `DELETE /api/v1/transfer-session` - 下書きを破棄

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use etransfer_domain::{contact::ContactId, transfer::TransferId};
use etransfer_shared::{ApiResponse, event_log::error::kind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    contact::ContactDto,
    transfer::{AmountInput, MoneyDto, RecordedTransferDto},
};
use crate::{
    error::ServerError,
    usecase::transfer::{RecordTransferInput, TransferDraft, TransferUseCaseImpl},
};

/// 下書きを保存する Cookie 名
pub const DRAFT_COOKIE_NAME: &str = "transfer_draft";

/// 送金セッション API の共有状態
///
/// `SignedCookieJar` が `Key` を取り出せるよう `Clone` + `FromRef` を実装する。
#[derive(Clone)]
pub struct TransferSessionState {
    pub usecase: Arc<TransferUseCaseImpl>,
    pub key:     Key,
}

impl FromRef<TransferSessionState> for Key {
    fn from_ref(state: &TransferSessionState) -> Self {
        state.key.clone()
    }
}

// --- リクエスト/レスポンス型 ---

/// 下書き作成リクエスト
#[derive(Debug, Deserialize)]
pub struct TransferSessionRequest {
    pub contact_id: Uuid,
    pub amount:     AmountInput,
    pub memo:       Option<String>,
}

/// 送金の確認内容 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TransferReviewDto {
    pub contact:   ContactDto,
    pub amount:    MoneyDto,
    pub memo:      Option<String>,
    /// `"credit"`（入金）または `"debit"`（出金）
    pub direction: String,
}

impl From<&TransferDraft> for TransferReviewDto {
    fn from(draft: &TransferDraft) -> Self {
        let direction = if draft.amount.is_credit() {
            "credit"
        } else {
            "debit"
        };
        Self {
            contact:   ContactDto::from(&draft.contact),
            amount:    MoneyDto::from(draft.amount),
            memo:      draft.memo.as_ref().map(|m| m.to_string()),
            direction: direction.to_string(),
        }
    }
}

/// Cookie に保存する下書き
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct StoredDraft {
    draft_id:   Uuid,
    contact_id: Uuid,
    amount:     String,
    memo:       Option<String>,
}

impl From<&TransferDraft> for StoredDraft {
    fn from(draft: &TransferDraft) -> Self {
        Self {
            draft_id:   *draft.id.as_uuid(),
            contact_id: *draft.contact.id().as_uuid(),
            amount:     draft.amount.to_string(),
            memo:       draft.memo.as_ref().map(|m| m.to_string()),
        }
    }
}

impl StoredDraft {
    fn encode(&self) -> Result<String, ServerError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ServerError::Internal(format!("下書きのシリアライズに失敗: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(value: &str) -> Result<Self, ServerError> {
        let invalid = |reason: String| {
            tracing::warn!(error.kind = kind::SESSION, reason = %reason, "送金の下書きを復元できません");
            ServerError::BadRequest("送金の下書きが不正です".to_string())
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| invalid(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))
    }

    fn into_input(self) -> RecordTransferInput {
        RecordTransferInput {
            contact_id: ContactId::from_uuid(self.contact_id),
            amount:     self.amount,
            memo:       self.memo,
        }
    }
}

fn draft_cookie(value: String) -> Cookie<'static> {
    Cookie::build((DRAFT_COOKIE_NAME, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build(DRAFT_COOKIE_NAME).path("/").build()
}

/// Cookie から下書きを取り出し、現在のデータで検証し直す
///
/// 保存後に連絡先が削除されていれば NotFound になる。
async fn load_draft(
    usecase: &TransferUseCaseImpl,
    jar: &SignedCookieJar,
) -> Result<TransferDraft, ServerError> {
    let cookie = jar
        .get(DRAFT_COOKIE_NAME)
        .ok_or_else(|| ServerError::NotFound("送金の下書きがありません".to_string()))?;
    let stored = StoredDraft::decode(cookie.value())?;
    let id = TransferId::from_uuid(stored.draft_id);
    let draft = usecase.prepare_transfer(stored.into_input()).await?;
    Ok(TransferDraft { id, ..draft })
}

// --- ハンドラ ---

/// POST /api/v1/transfer-session
///
/// ## レスポンス
///
/// - `200 OK`: 確認内容（`Set-Cookie` で下書きを保存）
/// - `400 Bad Request`: 金額・メモが不正
/// - `404 Not Found`: 連絡先が見つからない
#[tracing::instrument(skip_all)]
pub async fn start_transfer_session(
    State(state): State<TransferSessionState>,
    jar: SignedCookieJar,
    Json(req): Json<TransferSessionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let draft = state
        .usecase
        .prepare_transfer(RecordTransferInput {
            contact_id: ContactId::from_uuid(req.contact_id),
            amount:     req.amount.into_text(),
            memo:       req.memo,
        })
        .await?;

    let value = StoredDraft::from(&draft).encode()?;
    let jar = jar.add(draft_cookie(value));

    Ok((
        StatusCode::OK,
        jar,
        Json(ApiResponse::new(TransferReviewDto::from(&draft))),
    ))
}

/// GET /api/v1/transfer-session
#[tracing::instrument(skip_all)]
pub async fn get_transfer_session(
    State(state): State<TransferSessionState>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, ServerError> {
    let draft = load_draft(&state.usecase, &jar).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(TransferReviewDto::from(&draft))),
    ))
}

/// POST /api/v1/transfer-session/confirm
///
/// ## レスポンス
///
/// - `201 Created`: 送金を記録（通知の成否は `notification` を参照）、Cookie を削除
/// - `404 Not Found`: 下書きがない、または連絡先が削除された
/// - `409 Conflict`: 下書きが既に記録されている
#[tracing::instrument(skip_all)]
pub async fn confirm_transfer_session(
    State(state): State<TransferSessionState>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, ServerError> {
    let draft = load_draft(&state.usecase, &jar).await?;
    let output = state.usecase.record_draft(draft).await?;

    Ok((
        StatusCode::CREATED,
        jar.remove(removal_cookie()),
        Json(ApiResponse::new(RecordedTransferDto::from(&output))),
    ))
}

/// DELETE /api/v1/transfer-session
pub async fn discard_transfer_session(jar: SignedCookieJar) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, jar.remove(removal_cookie()))
}
