//! Caller identity middleware
//!
//! Reservation endpoints do not require authentication. A valid bearer
//! access token identifies the caller; a missing or invalid one leaves the
//! request anonymous.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::token::{TokenKeys, TokenType};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Resolves bearer tokens to user ids
#[derive(Clone, Default)]
pub struct Identity {
    keys: Option<TokenKeys>,
}

impl Identity {
    /// Identity backed by the shared signing secret
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys: Some(keys) }
    }

    /// Identity that treats every caller as anonymous
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let keys = self.keys.as_ref()?;
        match keys.verify_kind(token, TokenType::Access) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                debug!("Ignoring bearer token: {}", e);
                None
            }
        }
    }
}

/// The user on whose behalf a request runs, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Option<Uuid>);

/// Attach a [`Caller`] to every request; never rejects
pub async fn resolve_caller(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    let caller = bearer.and_then(|TypedHeader(auth)| state.identity.resolve(auth.token()));
    req.extensions_mut().insert(Caller(caller));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_resolves_to_subject() {
        let keys = TokenKeys::new("secret").unwrap();
        let user = Uuid::new_v4();
        let token = keys.issue(user, "ana", TokenType::Access, 60).unwrap();

        assert_eq!(Identity::new(keys).resolve(&token), Some(user));
    }

    #[test]
    fn test_unusable_tokens_are_anonymous() {
        let keys = TokenKeys::new("secret").unwrap();
        let refresh = keys
            .issue(Uuid::new_v4(), "ana", TokenType::Refresh, 60)
            .unwrap();
        let identity = Identity::new(keys.clone());

        assert_eq!(identity.resolve("garbage"), None);
        assert_eq!(identity.resolve(&refresh), None);

        let access = keys
            .issue(Uuid::new_v4(), "ana", TokenType::Access, 60)
            .unwrap();
        assert_eq!(Identity::anonymous().resolve(&access), None);
    }
}
