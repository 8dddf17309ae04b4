//! Request extractors: bearer user and admin key

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use playlist_export_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Authenticated requester (the token's `id` claim)
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authentication".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Authentication("Invalid Authorization header format".to_string())
        })?;

        let claims = state.jwt_decoder.decode_access_token(token)?;
        Ok(AuthUser {
            user_id: claims.id,
        })
    }
}

/// Operator holding the configured admin key
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

impl FromRequestParts<AppState> for AdminKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_key
            .as_deref()
            .ok_or_else(|| AppError::Authentication("Admin access is disabled".to_string()))?;

        let presented = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if presented != expected {
            return Err(AppError::Authentication("Invalid admin key".to_string()).into());
        }
        Ok(AdminKey)
    }
}
