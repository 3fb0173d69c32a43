//! # Request ID レイヤーのテスト
//!
//! サーバーと同じ Request ID 関連のレイヤー構成で、
//! 正常レスポンス・エラーレスポンスの双方に `X-Request-Id` が付くことを検証する。

use axum::{Router, body::Body, routing::get};
use etransfer_server::{error::ServerError, handler::health_check};
use etransfer_shared::observability::{MakeRequestUuidV7, make_request_span};
use http::{Request, StatusCode};
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

async fn missing_contact() -> Result<&'static str, ServerError> {
    Err(ServerError::NotFound("連絡先が見つかりません".to_string()))
}

fn test_app() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/contacts/missing", get(missing_contact))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_自動生成のx_request_idがuuid_v7形式である() {
    let response = test_app().oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id ヘッダーが含まれること")
        .to_str()
        .unwrap();
    let uuid = uuid::Uuid::parse_str(request_id)
        .unwrap_or_else(|_| panic!("有効な UUID であること: {request_id}"));
    assert_eq!(uuid.get_version(), Some(uuid::Version::SortRand));
}

#[tokio::test]
async fn test_クライアント提供のx_request_idがそのまま返される() {
    let custom_id = "client-request-42";

    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", custom_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        custom_id,
        "クライアント提供の Request ID がそのまま返されること"
    );
}

#[tokio::test]
async fn test_エラーレスポンスにもx_request_idが含まれる() {
    let response = test_app()
        .oneshot(get_request("/api/v1/contacts/missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
}
