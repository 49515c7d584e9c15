// src/auth/service.rs

use std::sync::Arc;

use tracing::{info, warn};

use super::jwt::{TokenSigner, TokenType};
use super::models::{JwtAuthResponse, LoginRequest, Principal, TokenRefreshRequest};
use super::password::verify_password;
use crate::error::{PdmsError, PdmsResult};
use crate::users::{RoleName, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService {
    users: Arc<UserStore>,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(users: Arc<UserStore>, signer: TokenSigner) -> Self {
        Self { users, signer }
    }

    pub async fn login(&self, req: LoginRequest) -> PdmsResult<JwtAuthResponse> {
        let user = match self.users.find_by_email(req.email.trim()).await? {
            Some(user) => user,
            None => {
                warn!(target: "audit", email = %req.email, success = false, "login attempt");
                return Err(PdmsError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        if !verify_password(&req.password, &user.password_hash)? {
            warn!(target: "audit", email = %req.email, success = false, "login attempt");
            return Err(PdmsError::unauthorized(INVALID_CREDENTIALS));
        }

        info!(target: "audit", email = %user.email, user_id = user.id, success = true, "login attempt");

        let roles = self.users.role_names_for(user.id).await?;
        self.issue(user.id, &user.email, &user.name, roles)
    }

    pub async fn refresh(&self, req: TokenRefreshRequest) -> PdmsResult<JwtAuthResponse> {
        let claims = self
            .signer
            .verify(&req.refresh_token, TokenType::Refresh)
            .map_err(|_| PdmsError::unauthorized("Invalid refresh token"))?;

        let user = self
            .users
            .get_row(claims.user_id()?)
            .await?
            .ok_or_else(|| PdmsError::unauthorized("User not found"))?;

        let roles = self.users.role_names_for(user.id).await?;
        self.issue(user.id, &user.email, &user.name, roles)
    }

    /// Tokens are stateless; logging out only records the event
    pub fn logout(&self, principal: &Principal) {
        info!(target: "audit", user_id = principal.id, "logout");
    }

    /// Resolve a bearer access token to the current state of its user
    pub async fn authenticate(&self, token: &str) -> PdmsResult<Principal> {
        let claims = self.signer.verify(token, TokenType::Access)?;
        let user = self
            .users
            .get_row(claims.user_id()?)
            .await?
            .ok_or_else(|| PdmsError::unauthorized("User no longer exists"))?;
        let roles = self.users.role_names_for(user.id).await?;

        Ok(Principal {
            id: user.id,
            email: user.email,
            name: user.name,
            roles,
        })
    }

    fn issue(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        roles: Vec<RoleName>,
    ) -> PdmsResult<JwtAuthResponse> {
        let access_token = self
            .signer
            .create_token(user_id, email, name, &roles, TokenType::Access)?;
        let refresh_token = self
            .signer
            .create_token(user_id, email, name, &roles, TokenType::Refresh)?;

        Ok(JwtAuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            roles,
        })
    }
}
