// Authorization: caller identities, the allow-list, and the admin extractor.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ── Caller identity ──────────────────────────────────────────────────

/// Who is asking for a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerId {
    Telegram {
        user_id: i64,
        username: Option<String>,
    },
    ApiKey {
        name: String,
    },
}

impl CallerId {
    pub fn telegram(user_id: i64, username: Option<String>) -> Self {
        CallerId::Telegram { user_id, username }
    }

    /// Identity recorded in `updated_by`, e.g. `telegram:alice` or `api:frontdesk`.
    pub fn display(&self) -> String {
        match self {
            CallerId::Telegram {
                username: Some(name),
                ..
            } => format!("telegram:{name}"),
            CallerId::Telegram { user_id, .. } => format!("telegram:user_{user_id}"),
            CallerId::ApiKey { name } => format!("api:{name}"),
        }
    }
}

/// Decides whether a caller may change court state.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, caller: &CallerId) -> bool;
}

// ── Allow-list ───────────────────────────────────────────────────────

/// Hash a raw API key with SHA-256. Only digests are kept in memory.
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Configured Telegram user ids and named API keys. Empty means nobody is authorized.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    telegram_users: HashSet<i64>,
    /// key digest -> key name
    api_keys: HashMap<String, String>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_telegram_users(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.telegram_users.extend(ids);
        self
    }

    /// Register a named API key. The raw key is hashed before storage.
    pub fn with_api_key(mut self, name: &str, key: &str) -> Self {
        self.api_keys.insert(hash_api_key(key), name.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.telegram_users.is_empty() && self.api_keys.is_empty()
    }

    /// Resolve a raw bearer key to the caller it belongs to.
    pub fn authenticate_api_key(&self, key: &str) -> Option<CallerId> {
        self.api_keys
            .get(&hash_api_key(key))
            .map(|name| CallerId::ApiKey { name: name.clone() })
    }
}

impl Authorizer for AllowList {
    fn is_authorized(&self, caller: &CallerId) -> bool {
        match caller {
            CallerId::Telegram { user_id, .. } => self.telegram_users.contains(user_id),
            CallerId::ApiKey { name } => self.api_keys.values().any(|n| n == name),
        }
    }
}

// ── Axum extractor: AdminCaller ──────────────────────────────────────

/// Extracts an API caller from `Authorization: Bearer <key>`.
/// The allow-list is read from request extensions (`Arc<AllowList>`).
#[derive(Debug, Clone)]
pub struct AdminCaller(pub CallerId);

impl<S> FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = |msg: &str| {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": msg })),
            )
        };

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let key = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

        let allow_list = parts.extensions.get::<Arc<AllowList>>().ok_or_else(|| {
            tracing::error!("AllowList missing from request extensions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Internal error" })),
            )
        })?;

        allow_list
            .authenticate_api_key(key.trim())
            .map(AdminCaller)
            .ok_or_else(|| unauthorized("Invalid API key"))
    }
}
