// src/access.rs
// Permission evaluation for projects and the folders and documents inside them

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::Principal;
use crate::error::{PdmsError, PdmsResult};
use crate::project::members::MemberStore;
use crate::project::types::ProjectRole;

const DENIED: &str = "You don't have access to this project";

/// Every check resolves the target first, so a missing entity is a 404
/// regardless of who asks.
pub struct AccessControl {
    pool: SqlitePool,
    members: Arc<MemberStore>,
}

impl AccessControl {
    pub fn new(pool: SqlitePool, members: Arc<MemberStore>) -> Self {
        Self { pool, members }
    }

    pub async fn can_access_project(&self, caller: &Principal, project_id: i64) -> PdmsResult<bool> {
        if caller.is_admin_or_director() {
            return Ok(true);
        }
        Ok(self.members.role_of(project_id, caller.id).await?.is_some())
    }

    pub async fn can_manage_project(&self, caller: &Principal, project_id: i64) -> PdmsResult<bool> {
        if caller.is_admin_or_director() {
            return Ok(true);
        }
        Ok(matches!(
            self.members.role_of(project_id, caller.id).await?,
            Some(ProjectRole::ProjectManager)
        ))
    }

    pub async fn require_project_access(&self, caller: &Principal, project_id: i64) -> PdmsResult<()> {
        self.require_project_exists(project_id).await?;
        if !self.can_access_project(caller, project_id).await? {
            return Err(PdmsError::forbidden(DENIED));
        }
        Ok(())
    }

    pub async fn require_project_manage(&self, caller: &Principal, project_id: i64) -> PdmsResult<()> {
        self.require_project_exists(project_id).await?;
        if !self.can_manage_project(caller, project_id).await? {
            return Err(PdmsError::forbidden("You don't have permission to manage this project"));
        }
        Ok(())
    }

    /// Project create/delete and the global chatbot
    pub fn require_admin_or_director(&self, caller: &Principal) -> PdmsResult<()> {
        if caller.is_admin_or_director() {
            Ok(())
        } else {
            Err(PdmsError::forbidden("Access denied"))
        }
    }

    /// Returns the owning project id
    pub async fn require_folder_access(&self, caller: &Principal, folder_id: i64) -> PdmsResult<i64> {
        let project_id = self.folder_project(folder_id).await?;
        if !self.can_access_project(caller, project_id).await? {
            return Err(PdmsError::forbidden(DENIED));
        }
        Ok(project_id)
    }

    /// Returns the owning project id
    pub async fn require_document_access(&self, caller: &Principal, document_id: i64) -> PdmsResult<i64> {
        let project_id = self.document_project(document_id).await?;
        if !self.can_access_project(caller, project_id).await? {
            return Err(PdmsError::forbidden(DENIED));
        }
        Ok(project_id)
    }

    pub async fn folder_project(&self, folder_id: i64) -> PdmsResult<i64> {
        sqlx::query_scalar("SELECT project_id FROM folders WHERE id = ?")
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Folder", folder_id))
    }

    pub async fn document_project(&self, document_id: i64) -> PdmsResult<i64> {
        sqlx::query_scalar(
            r#"
            SELECT f.project_id FROM documents d
            JOIN folders f ON f.id = d.folder_id
            WHERE d.id = ?
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PdmsError::entity_not_found("Document", document_id))
    }

    async fn require_project_exists(&self, project_id: i64) -> PdmsResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        exists
            .map(|_| ())
            .ok_or_else(|| PdmsError::entity_not_found("Project", project_id))
    }
}
