//! Staff JWT authentication extractors.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use domain::models::StaffIdentity;
use shared::jwt::{extract_staff_id, JwtConfig, JwtError};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated scanner operator taken from the `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct StaffAuth(pub StaffIdentity);

/// Like [`StaffAuth`], but rejects tokens without the admin role.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub StaffIdentity);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

/// Validates a bearer token into the identity it names.
pub fn authenticate(jwt: &JwtConfig, token: &str) -> Result<StaffIdentity, ApiError> {
    let claims = jwt.validate_staff_token(token).map_err(|e| match e {
        JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
        _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
    })?;
    let id = extract_staff_id(&claims)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;

    Ok(StaffIdentity {
        id,
        name: claims.name,
        role: claims.role,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for StaffAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<StaffIdentity>() {
            return Ok(StaffAuth(identity.clone()));
        }

        let identity = authenticate(&state.jwt, bearer_token(parts)?)?;
        parts.extensions.insert(identity.clone());
        Ok(StaffAuth(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let StaffAuth(identity) = StaffAuth::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminAuth(identity))
    }
}
