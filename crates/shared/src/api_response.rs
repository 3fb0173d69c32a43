//! # API レスポンスエンベロープ
//!
//! 公開 API の統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 公開 API の統一レスポンス型
///
/// 連絡先・送金・セッションの各エンドポイントは `{ "data": T }` 形式で返す。
///
/// ## 使用例
///
/// ```
/// use etransfer_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでdataキーに包まれる() {
        let response = ApiResponse::new(serde_json::json!({ "balance_cents": 4000 }));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "data": { "balance_cents": 4000 } })
        );
    }

    #[test]
    fn test_deserializeでjsonからオブジェクトに変換する() {
        let json = r#"{"data": ["alice", "bob"]}"#;
        let response: ApiResponse<Vec<String>> = serde_json::from_str(json).unwrap();

        assert_eq!(response.data, vec!["alice", "bob"]);
    }
}
