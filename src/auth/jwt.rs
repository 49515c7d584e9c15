// src/auth/jwt.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::auth::AuthConfig;
use crate::error::{PdmsError, PdmsResult};
use crate::users::RoleName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub name: String,
    pub roles: Vec<RoleName>,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> PdmsResult<i64> {
        self.sub
            .parse()
            .map_err(|_| PdmsError::unauthorized("Invalid token subject"))
    }
}

/// Signs and verifies access/refresh tokens with a shared HS256 secret
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::milliseconds(config.access_token_ttl_ms),
            refresh_ttl: Duration::milliseconds(config.refresh_token_ttl_ms),
        }
    }

    pub fn create_token(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        roles: &[RoleName],
        token_type: TokenType,
    ) -> PdmsResult<String> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| PdmsError::internal("Failed to calculate expiration"))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            roles: roles.to_vec(),
            token_type,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| PdmsError::internal(format!("Failed to create token: {}", e)))
    }

    /// Verify signature and expiry, then require the expected token type
    pub fn verify(&self, token: &str, expected: TokenType) -> PdmsResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| PdmsError::unauthorized(format!("Invalid token: {}", e)))?;

        if claims.token_type != expected {
            return Err(PdmsError::unauthorized("Invalid token type"));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdmsConfig;

    fn signer() -> TokenSigner {
        TokenSigner::new(&PdmsConfig::for_tests("/tmp").auth)
    }

    #[test]
    fn test_access_token_round_trip() {
        let signer = signer();
        let token = signer
            .create_token(7, "a@example.com", "A", &[RoleName::Director], TokenType::Access)
            .unwrap();

        let claims = signer.verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.roles, vec![RoleName::Director]);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let signer = signer();
        let token = signer
            .create_token(7, "a@example.com", "A", &[], TokenType::Refresh)
            .unwrap();

        assert!(signer.verify(&token, TokenType::Access).is_err());
        assert!(signer.verify(&token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let mut other = PdmsConfig::for_tests("/tmp").auth;
        other.jwt_secret = "another-secret".to_string();
        let token = TokenSigner::new(&other)
            .create_token(1, "a@example.com", "A", &[], TokenType::Access)
            .unwrap();

        assert!(signer().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut config = PdmsConfig::for_tests("/tmp").auth;
        config.access_token_ttl_ms = -60_000;
        let signer = TokenSigner::new(&config);
        let token = signer
            .create_token(1, "a@example.com", "A", &[], TokenType::Access)
            .unwrap();

        assert!(signer.verify(&token, TokenType::Access).is_err());
    }
}
