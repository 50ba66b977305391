//! Session and token header handling
//!
//! The mock service authenticates with a raw `token: <value>` header rather
//! than the standard `Authorization: Bearer <value>` scheme. Callers may use
//! either; [`normalize_token_header`] fills in `token` before sending.

use std::collections::BTreeMap;

use serde_json::Value;

/// Default user id expected by the mock service
pub const DEFAULT_USER_ID: &str = "1";

/// Default user key expected by the mock service
pub const DEFAULT_USER_KEY: &str = "test";

/// Authenticated session for one scenario. Never persisted or renewed.
#[derive(Clone)]
pub struct Session {
    /// Raw token from POST /auth/generate_token
    pub token: String,
    pub user_id: String,
    pub user_key: String,
}

impl Session {
    /// Session for the default mock user
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: DEFAULT_USER_ID.to_string(),
            user_key: DEFAULT_USER_KEY.to_string(),
        }
    }

    /// Extract the token from a token-generation body
    pub fn from_token_body(body: &Value) -> Option<Self> {
        body.get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }

    /// Headers carrying this session's token
    pub fn headers(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("token".to_string(), self.token.clone())])
    }

    /// `user` object embedded in bet placement bodies
    pub fn user_json(&self) -> Value {
        serde_json::json!({ "id": self.user_id, "userKey": self.user_key })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &format!("{}...", &self.token.chars().take(6).collect::<String>()))
            .field("user_id", &self.user_id)
            .field("user_key", &"[REDACTED]")
            .finish()
    }
}

/// Strip a leading `Bearer ` scheme (case-insensitive) from an Authorization value
pub fn strip_bearer(value: &str) -> &str {
    let trimmed = value.trim_start();
    match trimmed.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {
            let rest = &trimmed[6..];
            if rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                trimmed
            }
        }
        _ => trimmed,
    }
}

/// Synthesize a `token` header from `Authorization` when the caller gave no `token`.
/// Header names are matched case-insensitively.
pub fn normalize_token_header(headers: &mut BTreeMap<String, String>) {
    if headers.keys().any(|k| k.eq_ignore_ascii_case("token")) {
        return;
    }

    let raw_token = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| strip_bearer(v).to_string());

    if let Some(token) = raw_token {
        headers.insert("token".to_string(), token);
    }
}
