//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 入力値の検証失敗 |
//! | `NotFound` | 404 Not Found | 参照先エンティティが存在しない |
//! | `Conflict` | 409 Conflict | 一意制約・参照制約との競合 |
//!
//! ## 使用例
//!
//! ```rust
//! use etransfer_domain::DomainError;
//!
//! fn validate_memo(memo: &str) -> Result<(), DomainError> {
//!     if memo.len() > 400 {
//!         return Err(DomainError::Validation("メモが長すぎます".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_memo("家賃").is_ok());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 金額の形式が不正
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// `entity_type` にはエンティティの種類（"Contact", "Transfer"）を指定する。
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },

    /// 競合エラー
    ///
    /// 同じメールアドレスの連絡先が既に存在する、送金記録が残っている連絡先を
    /// 削除しようとした、などの場合に使用する。
    #[error("競合が発生しました: {0}")]
    Conflict(String),
}
