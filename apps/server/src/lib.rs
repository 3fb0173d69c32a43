//! # e-Transfer 通知サーバー ライブラリ
//!
//! 連絡先・送金記録の API ハンドラとユースケースを公開する。
//! ルーター構築と起動処理はバイナリ（`main.rs`）側が担当する。

pub mod error;
pub mod handler;
pub mod usecase;
