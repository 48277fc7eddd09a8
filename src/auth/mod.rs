pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

pub const ROLE_CANDIDATE: &str = "candidate";
pub const ROLE_HRD: &str = "hrd";
pub const ROLE_ADMIN: &str = "admin";

/// Roles the application recognizes; anything else is normalized back to
/// `candidate` by the sync-roles maintenance operation.
pub const KNOWN_ROLES: &[&str] = &[ROLE_CANDIDATE, ROLE_HRD, ROLE_ADMIN];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_staff(&self) -> bool {
        self.role == ROLE_HRD || self.role == ROLE_ADMIN
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Every privileged handler calls one of these before touching data; a wrong
/// role short-circuits with 403 while a missing/invalid token never reaches
/// the handler at all (the extractor rejects with 401).
pub fn require_staff(user: &AuthenticatedUser) -> Result<(), AppError> {
    if user.is_staff() {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

pub fn require_admin(user: &AuthenticatedUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
