//! # リポジトリ実装
//!
//! 連絡先と送金記録の永続化（Ledger Store）を提供する。
//!
//! ## 設計方針
//!
//! - **トレイトで抽象化**: ユースケース層はトレイト経由でアクセスし、テストではモックに差し替える
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **残高は導出値**: 残高は `SUM(amount_cents)` で都度計算し、保存しない

pub mod contact_repository;
pub mod transfer_repository;

pub use contact_repository::{ContactRepository, PostgresContactRepository};
pub use transfer_repository::{PostgresTransferRepository, RecentTransfer, TransferRepository};

/// `LIKE` / `ILIKE` のワイルドカード文字をエスケープする
///
/// `ESCAPE '\'` と組み合わせて使う。
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
