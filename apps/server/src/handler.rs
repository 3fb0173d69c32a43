//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲

pub mod contact;
pub mod health;
pub mod transfer;
pub mod transfer_session;

pub use contact::{
    ContactState,
    create_contact,
    delete_contact,
    get_balance,
    get_contact,
    list_contacts,
    update_contact,
};
pub use health::{ReadinessState, health_check, readiness_check};
pub use transfer::{TransferState, list_recent_transfers, list_transfers, record_transfer};
pub use transfer_session::{
    TransferSessionState,
    confirm_transfer_session,
    discard_transfer_session,
    get_transfer_session,
    start_transfer_session,
};
