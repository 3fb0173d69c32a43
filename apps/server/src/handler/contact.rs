//! # 連絡先ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/v1/contacts?search=` - 連絡先一覧（名前順）
//! - `POST /api/v1/contacts` - 連絡先作成
//! - `GET /api/v1/contacts/{contact_id}` - 連絡先詳細（残高付き）
//! - `PUT /api/v1/contacts/{contact_id}` - 連絡先更新
//! - `DELETE /api/v1/contacts/{contact_id}` - 連絡先削除
//! - `GET /api/v1/contacts/{contact_id}/balance` - 残高

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use etransfer_domain::contact::{Contact, ContactId};
use etransfer_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transfer::MoneyDto;
use crate::{
    error::ServerError,
    usecase::contact::{ContactUseCaseImpl, CreateContactInput, UpdateContactInput},
};

/// 連絡先 API の共有状態
pub struct ContactState {
    pub usecase: ContactUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 連絡先一覧のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub search: Option<String>,
}

/// 連絡先作成・更新リクエスト
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name:  String,
    pub email: String,
}

/// 連絡先 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactDto {
    pub id:         Uuid,
    pub name:       String,
    pub email:      String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Contact> for ContactDto {
    fn from(contact: &Contact) -> Self {
        Self {
            id:         *contact.id().as_uuid(),
            name:       contact.name().to_string(),
            email:      contact.email().to_string(),
            created_at: contact.created_at().to_rfc3339(),
            updated_at: contact.updated_at().to_rfc3339(),
        }
    }
}

/// 連絡先詳細 DTO（残高付き）
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactDetailDto {
    #[serde(flatten)]
    pub contact: ContactDto,
    pub balance: MoneyDto,
}

/// 残高 DTO
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BalanceDto {
    pub contact_id: Uuid,
    pub balance:    MoneyDto,
}

// --- ハンドラ ---

/// GET /api/v1/contacts
///
/// `search` を指定すると名前・メールアドレスの部分一致（大文字小文字を区別しない）で絞り込む。
#[tracing::instrument(skip_all)]
pub async fn list_contacts(
    State(state): State<Arc<ContactState>>,
    Query(query): Query<ContactListQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let contacts = state.usecase.list_contacts(query.search.as_deref()).await?;

    let items: Vec<ContactDto> = contacts.iter().map(ContactDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /api/v1/contacts
///
/// ## レスポンス
///
/// - `201 Created`: 作成された連絡先
/// - `400 Bad Request`: 名前・メールアドレスが不正
/// - `409 Conflict`: メールアドレス重複
#[tracing::instrument(skip_all)]
pub async fn create_contact(
    State(state): State<Arc<ContactState>>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let contact = state
        .usecase
        .create_contact(CreateContactInput {
            name:  req.name,
            email: req.email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ContactDto::from(&contact))),
    ))
}

/// GET /api/v1/contacts/{contact_id}
#[tracing::instrument(skip_all, fields(%contact_id))]
pub async fn get_contact(
    State(state): State<Arc<ContactState>>,
    Path(contact_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let (contact, balance) = state
        .usecase
        .get_contact_with_balance(&ContactId::from_uuid(contact_id))
        .await?;

    let response = ApiResponse::new(ContactDetailDto {
        contact: ContactDto::from(&contact),
        balance: MoneyDto::from(balance),
    });
    Ok((StatusCode::OK, Json(response)))
}

/// PUT /api/v1/contacts/{contact_id}
///
/// ## レスポンス
///
/// - `200 OK`: 更新後の連絡先
/// - `404 Not Found`: 連絡先が見つからない
/// - `409 Conflict`: メールアドレス重複
#[tracing::instrument(skip_all, fields(%contact_id))]
pub async fn update_contact(
    State(state): State<Arc<ContactState>>,
    Path(contact_id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let contact = state
        .usecase
        .update_contact(UpdateContactInput {
            contact_id: ContactId::from_uuid(contact_id),
            name:       req.name,
            email:      req.email,
        })
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(ContactDto::from(&contact)))))
}

/// DELETE /api/v1/contacts/{contact_id}
///
/// ## レスポンス
///
/// - `204 No Content`: 削除成功
/// - `404 Not Found`: 連絡先が見つからない
/// - `409 Conflict`: 送金記録が残っている
#[tracing::instrument(skip_all, fields(%contact_id))]
pub async fn delete_contact(
    State(state): State<Arc<ContactState>>,
    Path(contact_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    state
        .usecase
        .delete_contact(&ContactId::from_uuid(contact_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/contacts/{contact_id}/balance
#[tracing::instrument(skip_all, fields(%contact_id))]
pub async fn get_balance(
    State(state): State<Arc<ContactState>>,
    Path(contact_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let balance = state
        .usecase
        .get_balance(&ContactId::from_uuid(contact_id))
        .await?;

    let response = ApiResponse::new(BalanceDto {
        contact_id,
        balance: MoneyDto::from(balance),
    });
    Ok((StatusCode::OK, Json(response)))
}
