/*
 * Responsibility
 * - TokenReview request/response wire types
 * - shape follows k8s.io/api/authentication/v1 (camelCase, absent-if-unset)
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    // Cleared before the envelope is echoed back; the token never leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<TokenReviewSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TokenReviewStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenReviewSpec {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenReviewStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub username: String,
    pub uid: String,
    pub groups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_server_request() {
        let body = r#"{
            "apiVersion": "authentication.k8s.io/v1",
            "kind": "TokenReview",
            "spec": {"token": "alice:s3cret"}
        }"#;

        let review: TokenReview = serde_json::from_str(body).unwrap();
        assert_eq!(review.api_version.as_deref(), Some("authentication.k8s.io/v1"));
        assert_eq!(review.kind.as_deref(), Some("TokenReview"));
        assert_eq!(review.spec.unwrap().token, "alice:s3cret");
        assert!(review.status.is_none());
    }

    #[test]
    fn response_round_trips_without_field_loss() {
        let review = TokenReview {
            api_version: Some("authentication.k8s.io/v1".to_string()),
            kind: Some("TokenReview".to_string()),
            spec: None,
            status: Some(TokenReviewStatus {
                authenticated: true,
                user: Some(UserInfo {
                    username: "alice".to_string(),
                    uid: "alice".to_string(),
                    groups: vec!["eng".to_string(), "oncall".to_string()],
                }),
            }),
        };

        let encoded = serde_json::to_string(&review).unwrap();
        let decoded: TokenReview = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, review);
    }

    #[test]
    fn unset_fields_are_omitted() {
        let review = TokenReview {
            status: Some(TokenReviewStatus {
                authenticated: false,
                user: None,
            }),
            ..Default::default()
        };

        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": {"authenticated": false}})
        );
    }
}
