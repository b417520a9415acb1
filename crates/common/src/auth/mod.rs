//! Identity extraction for the gateway
//!
//! Authentication itself is external: an upstream auth proxy validates the
//! caller's token and forwards the resolved identity in headers. These
//! extractors only read those headers; token issuance and OAuth handshakes
//! never reach this service.

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Header carrying the resolved permanent user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the anonymous session identifier
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Identity of an authenticated user, extracted from proxy headers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Resolved permanent user id
    pub user_id: Uuid,

    /// Request ID for tracing
    pub request_id: String,
}

/// Identity of an anonymous session, extracted from proxy headers
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Opaque session identifier chosen by the client
    pub session_id: String,

    /// Request ID for tracing
    pub request_id: String,
}

fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing or invalid X-User-ID header".to_string(),
            })?;

        Ok(AuthContext {
            user_id,
            request_id: request_id(parts),
        })
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let session_id = parts
            .headers
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing X-Session-ID header".to_string(),
            })?;

        Ok(SessionContext {
            session_id,
            request_id: request_id(parts),
        })
    }
}
