//! `AuthUser` extractor — reads the identity headers set by the trusted
//! upstream proxy and injects a request context.
//!
//! This service does not terminate authentication itself; `x-user-id`
//! and `x-user-role` are asserted by the identity layer in front of it.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use chrono::Utc;
use uuid::Uuid;

use screenbook_core::error::AppError;
use screenbook_service::context::{RequestContext, UserRole};

use crate::error::ApiError;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }

    /// Rejects non-admin callers.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(AppError::authorization("Admin role required"))
        }
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn context_from_parts(parts: &Parts) -> Result<Option<RequestContext>, AppError> {
    let Some(raw_id) = parts.headers.get("x-user-id") else {
        return Ok(None);
    };
    let user_id: Uuid = raw_id
        .to_str()
        .ok()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::authentication("Malformed x-user-id header"))?;

    let role = match parts.headers.get("x-user-role") {
        None => UserRole::User,
        Some(raw) => raw
            .to_str()
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| AppError::authentication("Malformed x-user-role header"))?,
    };

    Ok(Some(RequestContext::new(user_id, role, Utc::now())))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_from_parts(parts)?
            .map(AuthUser)
            .ok_or_else(|| AppError::authentication("Missing x-user-id header").into())
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(context_from_parts(parts)?.map(AuthUser))
    }
}
