//! # アプリケーション構築
//!
//! DI（リポジトリ・ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use etransfer_domain::{
    clock::{Clock, SystemClock},
    notification::NotificationError,
};
use etransfer_infra::{
    notification::NotificationSender,
    repository::{
        ContactRepository,
        PostgresContactRepository,
        PostgresTransferRepository,
        TransferRepository,
    },
};
use etransfer_server::{
    handler::{
        ContactState,
        ReadinessState,
        TransferSessionState,
        TransferState,
        confirm_transfer_session,
        create_contact,
        delete_contact,
        discard_transfer_session,
        get_balance,
        get_contact,
        get_transfer_session,
        health_check,
        list_contacts,
        list_recent_transfers,
        list_transfers,
        readiness_check,
        record_transfer,
        start_transfer_session,
        update_contact,
    },
    usecase::{ContactUseCaseImpl, NotificationService, TemplateRenderer, TransferUseCaseImpl},
};
use etransfer_shared::observability::{MakeRequestUuidV7, make_request_span};
use sqlx::PgPool;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// DI コンテナの構築とルーター定義を行う
///
/// インフラ初期化済みの依存を受け取り、リポジトリ → ユースケース → State → Router の
/// 順に組み立てる。テンプレートの読み込みに失敗した場合はエラーを返す。
pub(crate) fn build_app(
    pool: PgPool,
    notification_sender: Arc<dyn NotificationSender>,
    sender_name: &str,
    cookie_key: Key,
) -> Result<Router, NotificationError> {
    let contact_repository: Arc<dyn ContactRepository> =
        Arc::new(PostgresContactRepository::new(pool.clone()));
    let transfer_repository: Arc<dyn TransferRepository> =
        Arc::new(PostgresTransferRepository::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let notification_service = Arc::new(NotificationService::new(
        notification_sender,
        TemplateRenderer::new()?,
        sender_name,
    ));

    let contact_state = Arc::new(ContactState {
        usecase: ContactUseCaseImpl::new(
            contact_repository.clone(),
            transfer_repository.clone(),
            clock.clone(),
        ),
    });

    // 送金 API と送金セッション API は同じユースケースを共有する
    let transfer_usecase = Arc::new(TransferUseCaseImpl::new(
        contact_repository,
        transfer_repository,
        notification_service,
        clock,
    ));
    let transfer_state = Arc::new(TransferState {
        usecase: transfer_usecase.clone(),
    });
    let session_state = TransferSessionState {
        usecase: transfer_usecase,
        key:     cookie_key,
    };

    let readiness_state = Arc::new(ReadinessState { pool });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(readiness_state)
        // 連絡先 API
        .route("/api/v1/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/v1/contacts/{contact_id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/api/v1/contacts/{contact_id}/balance", get(get_balance))
        .with_state(contact_state)
        // 送金 API
        .route(
            "/api/v1/contacts/{contact_id}/transfers",
            get(list_transfers).post(record_transfer),
        )
        .route("/api/v1/transfers", get(list_recent_transfers))
        .with_state(transfer_state)
        // 送金セッション API（署名付き Cookie）
        .route(
            "/api/v1/transfer-session",
            post(start_transfer_session)
                .get(get_transfer_session)
                .delete(discard_transfer_session),
        )
        .route(
            "/api/v1/transfer-session/confirm",
            post(confirm_transfer_session),
        )
        .with_state(session_state)
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: カスタムスパンに request_id を含める
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));

    Ok(app)
}
