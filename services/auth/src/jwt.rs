//! Token issuing for authenticated users

use common::{
    error::TokenError,
    token::{Claims, JwtConfig, TokenKeys, TokenType},
};
use serde::Serialize;

use crate::models::User;

/// Access and refresh tokens handed out at login
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Fresh access token handed out on refresh
#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    keys: TokenKeys,
    access_token_expiry: u64,
    refresh_token_expiry: u64,
}

impl JwtService {
    /// Create a new JWT service; fails when no secret is configured
    pub fn new(config: JwtConfig) -> Result<Self, TokenError> {
        Ok(Self {
            keys: TokenKeys::new(&config.secret)?,
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
        })
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        let access_token = self.keys.issue(
            user.id,
            &user.username,
            TokenType::Access,
            self.access_token_expiry,
        )?;
        let refresh_token = self.keys.issue(
            user.id,
            &user.username,
            TokenType::Refresh,
            self.refresh_token_expiry,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.access_token_expiry,
        })
    }

    /// Exchange a refresh token for a new access token
    pub fn refresh(&self, refresh_token: &str) -> Result<(Claims, AccessToken), TokenError> {
        let claims = self.keys.verify_kind(refresh_token, TokenType::Refresh)?;
        let access_token = self.keys.issue(
            claims.sub,
            &claims.username,
            TokenType::Access,
            self.access_token_expiry,
        )?;

        Ok((
            claims,
            AccessToken {
                access_token,
                token_type: "Bearer",
                expires_in: self.access_token_expiry,
            },
        ))
    }

    /// Validate an access token
    pub fn authenticate(&self, access_token: &str) -> Result<Claims, TokenError> {
        self.keys.verify_kind(access_token, TokenType::Access)
    }
}
