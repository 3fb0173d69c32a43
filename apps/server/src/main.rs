//! # e-Transfer 通知サーバー
//!
//! 連絡先への送金を記録し、Interac e-Transfer 形式の通知メールを送信する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `PORT` | No | ポート番号（デフォルト: `5000`） |
//! | `DEBUG` | No | `true` で既定のログレベルを debug にする |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//! | `SECRET_KEY` | No | セッション Cookie の署名鍵（32 バイト以上） |
//! | `DATABASE_URL` | No | PostgreSQL 接続 URL（未設定なら `DB_*` から組み立てる） |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `noop`（デフォルト: `smtp`） |
//! | `SMTP_CONFIG_FILE` | No | SMTP 設定 JSON（デフォルト: `email_config.json`） |
//! | `SMTP_*` | No | SMTP 設定の上書き（`SMTP_SENDER_EMAIL` など） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（メール送信なし）
//! NOTIFICATION_BACKEND=noop cargo run -p etransfer-server
//!
//! # 本番環境
//! LOG_FORMAT=json SECRET_KEY=... DATABASE_URL=postgres://... cargo run -p etransfer-server --release
//! ```

mod app_builder;
mod config;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum_extra::extract::cookie::Key;
use config::{AppConfig, NotificationBackend};
use etransfer_infra::{
    db,
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
};
use etransfer_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. アプリケーション設定の読み込み
/// 3. トレーシングの初期化
/// 4. データベース接続とマイグレーション
/// 5. ルーターの構築
/// 6. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;

    init_tracing(&TracingConfig::new(
        "etransfer-server",
        config.log_format,
        config.debug,
    ));
    let _tracing_guard = tracing::info_span!("app", service = "etransfer-server").entered();

    tracing::info!("サーバーを起動します: {}:{}", config.host, config.port);

    let pool = db::create_pool(&config.database.url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    let notification_sender: Arc<dyn NotificationSender> = match config.notification.backend {
        NotificationBackend::Smtp => {
            if !config.notification.smtp.is_complete() {
                tracing::warn!(
                    "SMTP の送信元アドレスまたはパスワードが未設定です。通知メールは送信に失敗します"
                );
            }
            tracing::info!(
                server = %config.notification.smtp.server,
                port = config.notification.smtp.port,
                use_tls = config.notification.smtp.use_tls,
                "通知バックエンド: SMTP"
            );
            Arc::new(SmtpNotificationSender::new(config.notification.smtp.clone()))
        }
        NotificationBackend::Noop => {
            tracing::info!("通知バックエンド: Noop");
            Arc::new(NoopNotificationSender)
        }
    };

    let cookie_key = match &config.secret_key {
        Some(secret_key) => secret_key.to_cookie_key(),
        None => {
            tracing::warn!("SECRET_KEY が未設定のため署名鍵を生成します。再起動すると送金セッションは失効します");
            Key::generate()
        }
    };

    let app = app_builder::build_app(
        pool,
        notification_sender,
        &config.notification.smtp.sender_name,
        cookie_key,
    )
    .context("アプリケーションの構築に失敗しました")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} へのバインドに失敗しました"))?;
    tracing::info!("サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await.context("サーバーが異常終了しました")?;

    Ok(())
}
