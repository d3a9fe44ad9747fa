//! Bearer token extraction for protected endpoints

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::token::Claims;
use tracing::debug;

use crate::{AppState, error::AuthError};

/// Claims of a verified access token
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AuthError::Unauthorized)?;

        let claims = state
            .jwt_service
            .authenticate(bearer.token())
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                AuthError::Unauthorized
            })?;

        Ok(AuthUser(claims))
    }
}
