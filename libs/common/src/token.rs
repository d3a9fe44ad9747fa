//! JWT claims and keys shared by the auth and reservation services
//!
//! Tokens are HS256-signed with a shared secret. The auth service issues
//! them; the reservation service only verifies access tokens to resolve the
//! caller's user id.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// JWT configuration
///
/// # Environment Variables
/// - `JWT_SECRET`: Shared signing secret
/// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 86400)
/// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens
    #[serde(default)]
    pub secret: String,
    /// Access token expiration time in seconds
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry: u64,
}

fn default_access_expiry() -> u64 {
    24 * 60 * 60
}

fn default_refresh_expiry() -> u64 {
    7 * 24 * 60 * 60
}

impl JwtConfig {
    /// Create a new JwtConfig from `JWT_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        crate::settings::from_env("JWT")
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username at issue time
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Signing and verification keys derived from the shared secret
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Sign a token of the given type for a user, valid for `ttl_seconds`
    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        token_type: TokenType,
        ttl_seconds: u64,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            exp: now + ttl_seconds,
            token_type,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Validate signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    /// Like [`TokenKeys::verify`], additionally requiring the token type
    pub fn verify_kind(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issued_access_token_verifies() {
        let keys = TokenKeys::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();

        let token = keys.issue(user_id, "ana", TokenType::Access, 60).unwrap();
        let claims = keys.verify_kind(&token, TokenType::Access).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let keys = TokenKeys::new(SECRET).unwrap();
        let token = keys
            .issue(Uuid::new_v4(), "ana", TokenType::Refresh, 60)
            .unwrap();

        assert!(matches!(
            keys.verify_kind(&token, TokenType::Access),
            Err(TokenError::WrongType)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenKeys::new("another-secret").unwrap();
        let verifier = TokenKeys::new(SECRET).unwrap();
        let token = issuer
            .issue(Uuid::new_v4(), "ana", TokenType::Access, 60)
            .unwrap();

        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = TokenKeys::new(SECRET).unwrap();
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "ana".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            token_type: TokenType::Access,
        };
        let token = keys.sign(&claims).unwrap();

        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_empty_secret_is_refused() {
        assert!(matches!(TokenKeys::new(""), Err(TokenError::MissingSecret)));
    }
}
