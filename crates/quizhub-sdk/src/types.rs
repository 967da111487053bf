//! Type definitions for the QuizHub SDK

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Credentials posted to `/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User summary returned alongside login tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Outcome of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// User info, when the backend sent it
    pub user: Option<SessionUser>,
    /// Whether a refresh token was stored
    pub refreshable: bool,
}

/// Unwrap the `{ "data": ... }` envelope used by most endpoints.
///
/// Bodies without the envelope are returned as they are.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_data() {
        assert_eq!(
            unwrap_data(json!({ "statusCode": 200, "data": { "id": "q1" } })),
            json!({ "id": "q1" })
        );
        assert_eq!(unwrap_data(json!([1, 2])), json!([1, 2]));
        assert_eq!(unwrap_data(json!({ "id": "me" })), json!({ "id": "me" }));
        assert_eq!(unwrap_data(Value::Null), Value::Null);
    }

    #[test]
    fn test_session_user_optional_fields() {
        let user: SessionUser = serde_json::from_value(json!({ "id": "u1", "name": "Ana" })).unwrap();
        assert_eq!(user.name.as_deref(), Some("Ana"));
        assert_eq!(user.role, None);
    }
}
