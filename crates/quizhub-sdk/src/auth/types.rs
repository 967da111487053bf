//! Authentication-related types
//!
//! Token payloads returned by `/login` and `/refresh`, and session status
//! derived from the access token's `exp` claim.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access/refresh token pair as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// New access token
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,

    /// Rotated refresh token, when the server issued one
    #[serde(
        rename = "refreshToken",
        alias = "refresh_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

impl AuthTokens {
    /// Extract tokens from a response body.
    ///
    /// The backend answers either `{ "data": { "token": ... } }` or
    /// `{ "token": ... }`; both are accepted. Returns `None` when no
    /// non-empty access token can be found.
    pub fn from_body(body: &Value) -> Option<Self> {
        let candidates = [body.get("data"), Some(body)];
        candidates
            .into_iter()
            .flatten()
            .filter(|v| v.is_object())
            .find_map(|v| serde_json::from_value::<AuthTokens>(v.clone()).ok())
            .filter(|tokens| !tokens.token.is_empty())
            .map(|mut tokens| {
                tokens.refresh_token = tokens.refresh_token.filter(|r| !r.is_empty());
                tokens
            })
    }
}

/// State of the stored session, as far as the client can tell locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No access token stored
    Anonymous,
    /// An access token is stored and has not passed its `exp` claim
    Active {
        /// Expiry from the JWT, when the token is a decodable JWT
        expires_at: Option<DateTime<Utc>>,
        /// Whether a refresh token is available
        can_refresh: bool,
    },
    /// The stored access token has passed its `exp` claim
    Expired {
        expires_at: DateTime<Utc>,
        can_refresh: bool,
    },
}

impl SessionStatus {
    /// Classify a stored token pair against the current time
    pub fn evaluate(access_token: Option<&str>, has_refresh_token: bool, now: DateTime<Utc>) -> Self {
        let Some(token) = access_token else {
            return SessionStatus::Anonymous;
        };

        match jwt_expiry(token) {
            Some(expires_at) if expires_at <= now => SessionStatus::Expired {
                expires_at,
                can_refresh: has_refresh_token,
            },
            expires_at => SessionStatus::Active {
                expires_at,
                can_refresh: has_refresh_token,
            },
        }
    }
}

/// Read the `exp` claim from a JWT without verifying it
///
/// Returns `None` for anything that is not a three-part JWT with a numeric `exp`.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    // Some issuers pad the payload; the URL-safe engine here expects no padding
    let payload = parts[1].trim_end_matches('=');
    let decoded = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;

    let json: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = json.get("exp")?;
    let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "u1", "exp": exp }).to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_tokens_nested_under_data() {
        let body = json!({
            "statusCode": 200,
            "success": true,
            "data": { "token": "new-access", "refreshToken": "new-refresh" }
        });
        let tokens = AuthTokens::from_body(&body).unwrap();
        assert_eq!(tokens.token, "new-access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("new-refresh"));
    }

    #[test]
    fn test_tokens_top_level_without_rotation() {
        let body = json!({ "token": "new-access" });
        let tokens = AuthTokens::from_body(&body).unwrap();
        assert_eq!(tokens.token, "new-access");
        assert_eq!(tokens.refresh_token, None);
    }

    #[test]
    fn test_tokens_snake_case_names() {
        let body = json!({ "access_token": "a", "refresh_token": "r" });
        let tokens = AuthTokens::from_body(&body).unwrap();
        assert_eq!(tokens.token, "a");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_tokens_missing_or_empty() {
        assert!(AuthTokens::from_body(&json!({ "data": { "user": {} } })).is_none());
        assert!(AuthTokens::from_body(&json!({ "token": "" })).is_none());
        assert!(AuthTokens::from_body(&Value::Null).is_none());

        let tokens = AuthTokens::from_body(&json!({ "token": "a", "refreshToken": "" })).unwrap();
        assert_eq!(tokens.refresh_token, None);
    }

    #[test]
    fn test_jwt_expiry_decoding() {
        let token = jwt_with_exp(1_700_000_000);
        assert_eq!(jwt_expiry(&token).unwrap().timestamp(), 1_700_000_000);
        assert!(jwt_expiry("opaque-token").is_none());
        assert!(jwt_expiry("a.!!!.c").is_none());
    }

    #[test]
    fn test_session_status() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        assert_eq!(SessionStatus::evaluate(None, true, now), SessionStatus::Anonymous);

        let expired = jwt_with_exp(1_699_999_000);
        assert!(matches!(
            SessionStatus::evaluate(Some(&expired), true, now),
            SessionStatus::Expired { can_refresh: true, .. }
        ));

        let valid = jwt_with_exp(1_700_003_600);
        assert!(matches!(
            SessionStatus::evaluate(Some(&valid), false, now),
            SessionStatus::Active { expires_at: Some(_), can_refresh: false }
        ));

        assert_eq!(
            SessionStatus::evaluate(Some("opaque"), false, now),
            SessionStatus::Active { expires_at: None, can_refresh: false }
        );
    }
}
