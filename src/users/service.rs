// src/users/service.rs
// Account administration: permission checks, validation and auditing

use std::sync::Arc;

use tracing::info;

use super::store::{RoleStore, UserStore};
use super::types::{CreateUserRequest, Role, RoleName, UpdateUserRequest, UserResponse};
use super::validator::{validate_email, validate_name, validate_password};
use crate::auth::{Principal, hash_password};
use crate::error::{PdmsError, PdmsResult};
use crate::page::{Page, PageParams};

const STAFF: [RoleName; 2] = [RoleName::Admin, RoleName::Director];

pub struct UserService {
    users: Arc<UserStore>,
    roles: Arc<RoleStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<UserStore>, roles: Arc<RoleStore>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            roles,
            bcrypt_cost,
        }
    }

    pub async fn create(&self, caller: &Principal, req: CreateUserRequest) -> PdmsResult<UserResponse> {
        require_role(caller, &[RoleName::Admin])?;

        let email = req.email.trim();
        validate_email(email)?;
        validate_password(&req.password)?;
        validate_name(&req.name)?;

        if self.users.email_exists(email).await? {
            return Err(PdmsError::conflict("Email is already in use"));
        }
        self.roles.require_all(&req.role_ids).await?;

        let hash = self.hash(&req.password)?;
        let user = self
            .users
            .create(email, &hash, req.name.trim(), &req.role_ids)
            .await?;

        info!(
            target: "audit",
            actor = caller.id,
            user_id = user.id,
            roles = ?role_names(&user.roles),
            "user created"
        );
        Ok(user)
    }

    pub async fn get(&self, caller: &Principal, id: i64) -> PdmsResult<UserResponse> {
        let user = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("User", id))?;
        require_self_or_staff(caller, id)?;
        Ok(user)
    }

    pub async fn list(&self, caller: &Principal, params: &PageParams) -> PdmsResult<Page<UserResponse>> {
        require_role(caller, &STAFF)?;
        self.users.list(params).await
    }

    pub async fn search(
        &self,
        caller: &Principal,
        query: &str,
        params: &PageParams,
    ) -> PdmsResult<Page<UserResponse>> {
        require_role(caller, &STAFF)?;
        self.users.search(query, params).await
    }

    pub async fn update(
        &self,
        caller: &Principal,
        id: i64,
        req: UpdateUserRequest,
    ) -> PdmsResult<UserResponse> {
        if self.users.get_row(id).await?.is_none() {
            return Err(PdmsError::entity_not_found("User", id));
        }
        require_self_or_staff(caller, id)?;

        let email = req.email.trim();
        validate_email(email)?;
        validate_name(&req.name)?;

        if self.users.email_taken_by_other(email, id).await? {
            return Err(PdmsError::conflict("Email is already in use"));
        }

        let password_hash = if req.password_change_requested() {
            let password = req.password.as_deref().unwrap_or_default();
            validate_password(password)?;
            Some(self.hash(password)?)
        } else {
            None
        };

        // Role changes from non-staff callers are ignored, not rejected
        let role_ids = match req.role_ids.as_deref() {
            Some(ids) if !ids.is_empty() && caller.has_any_role(&STAFF) => {
                self.roles.require_all(ids).await?;
                Some(ids)
            }
            _ => None,
        };

        let user = self
            .users
            .update(id, email, req.name.trim(), password_hash.as_deref(), role_ids)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("User", id))?;

        info!(
            target: "audit",
            actor = caller.id,
            user_id = id,
            password_changed = password_hash.is_some(),
            roles_replaced = role_ids.is_some(),
            "user updated"
        );
        Ok(user)
    }

    pub async fn delete(&self, caller: &Principal, id: i64) -> PdmsResult<()> {
        require_role(caller, &STAFF)?;
        if caller.id == id {
            return Err(PdmsError::invalid("You cannot delete your own account"));
        }
        if !self.users.delete(id).await? {
            return Err(PdmsError::entity_not_found("User", id));
        }
        info!(target: "audit", actor = caller.id, user_id = id, "user deleted");
        Ok(())
    }

    pub async fn email_exists(&self, email: &str) -> PdmsResult<bool> {
        self.users.email_exists(email.trim()).await
    }

    pub async fn roles(&self, caller: &Principal) -> PdmsResult<Vec<Role>> {
        require_role(caller, &STAFF)?;
        self.roles.list().await
    }

    pub async fn role(&self, caller: &Principal, id: i64) -> PdmsResult<Role> {
        require_role(caller, &STAFF)?;
        self.roles
            .get(id)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Role", id))
    }

    fn hash(&self, password: &str) -> PdmsResult<String> {
        hash_password(password, self.bcrypt_cost)
    }
}

fn require_role(caller: &Principal, roles: &[RoleName]) -> PdmsResult<()> {
    if caller.has_any_role(roles) {
        Ok(())
    } else {
        Err(PdmsError::forbidden("Access denied"))
    }
}

fn require_self_or_staff(caller: &Principal, id: i64) -> PdmsResult<()> {
    if caller.id == id || caller.has_any_role(&STAFF) {
        Ok(())
    } else {
        Err(PdmsError::forbidden("Access denied"))
    }
}

fn role_names(roles: &[Role]) -> Vec<&str> {
    roles.iter().map(|r| r.name.as_str()).collect()
}

