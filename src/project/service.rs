// src/project/service.rs
// Project and membership operations with permission checks

use std::sync::Arc;

use tracing::{info, warn};

use super::members::MemberStore;
use super::store::{ProjectFilter, ProjectStore};
use super::types::{
    AddMemberRequest, CreateProjectRequest, ProjectListParams, ProjectMember, ProjectRole,
    ProjectStatus, ProjectSummary, UpdateMemberRequest, UpdateProjectRequest,
    validate_project_name,
};
use crate::access::AccessControl;
use crate::auth::Principal;
use crate::error::{PdmsError, PdmsResult};
use crate::page::{Page, PageParams};
use crate::storage::{FileSystemStorage, project_dir};
use crate::users::{UserStore, UserSummary};

pub struct ProjectService {
    projects: Arc<ProjectStore>,
    members: Arc<MemberStore>,
    users: Arc<UserStore>,
    access: Arc<AccessControl>,
    storage: Arc<FileSystemStorage>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<ProjectStore>,
        members: Arc<MemberStore>,
        users: Arc<UserStore>,
        access: Arc<AccessControl>,
        storage: Arc<FileSystemStorage>,
    ) -> Self {
        Self {
            projects,
            members,
            users,
            access,
            storage,
        }
    }

    /// Admins and directors see every project, everyone else only their own
    pub async fn list(
        &self,
        caller: &Principal,
        params: ProjectListParams,
    ) -> PdmsResult<Page<ProjectSummary>> {
        let status = params
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(ProjectStatus::parse)
            .transpose()?;

        let filter = ProjectFilter {
            status,
            name: params.name,
            member_id: (!caller.is_admin_or_director()).then_some(caller.id),
        };
        let page = PageParams {
            page: params.page,
            size: params.size,
        };

        self.projects.list(&filter, &page).await
    }

    pub async fn get(&self, caller: &Principal, id: i64) -> PdmsResult<ProjectSummary> {
        self.access.require_project_access(caller, id).await?;
        self.summary(id).await
    }

    pub async fn create(
        &self,
        caller: &Principal,
        req: CreateProjectRequest,
    ) -> PdmsResult<ProjectSummary> {
        self.access.require_admin_or_director(caller)?;
        let name = validate_project_name(&req.name)?;
        let description = req.description.as_deref().map(str::trim);

        let project = self.projects.create(&name, description, caller.id).await?;
        info!(project_id = project.id, created_by = caller.id, "project created");
        self.summary(project.id).await
    }

    pub async fn update(
        &self,
        caller: &Principal,
        id: i64,
        req: UpdateProjectRequest,
    ) -> PdmsResult<ProjectSummary> {
        self.access.require_project_manage(caller, id).await?;

        let name = req.name.as_deref().map(validate_project_name).transpose()?;
        let status = req.status.as_deref().map(ProjectStatus::parse).transpose()?;
        let description = req.description.as_deref().map(str::trim);

        self.projects
            .update(id, name.as_deref(), description, status)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Project", id))?;
        self.summary(id).await
    }

    /// Removes the project with everything in it, including stored files
    pub async fn delete(&self, caller: &Principal, id: i64) -> PdmsResult<()> {
        self.projects.require(id).await?;
        self.access.require_admin_or_director(caller)?;

        self.projects.delete(id).await?;
        if let Err(e) = self.storage.remove_dir(&project_dir(id)).await {
            warn!(project_id = id, error = %e, "project files were not removed");
        }

        info!(target: "audit", actor = caller.id, project_id = id, "project deleted");
        Ok(())
    }

    pub async fn members(&self, caller: &Principal, project_id: i64) -> PdmsResult<Vec<ProjectMember>> {
        self.access.require_project_access(caller, project_id).await?;
        self.members.list(project_id).await
    }

    pub async fn add_member(
        &self,
        caller: &Principal,
        project_id: i64,
        req: AddMemberRequest,
    ) -> PdmsResult<ProjectMember> {
        self.access.require_project_manage(caller, project_id).await?;
        let role = ProjectRole::parse(&req.role)?;
        if self.users.get_row(req.user_id).await?.is_none() {
            return Err(PdmsError::entity_not_found("User", req.user_id));
        }

        let member = self
            .members
            .add(project_id, req.user_id, role, caller.id)
            .await?;
        self.projects.touch(project_id).await?;

        info!(
            target: "audit",
            actor = caller.id,
            project_id,
            user_id = req.user_id,
            role = role.as_str(),
            "member added"
        );
        Ok(member)
    }

    pub async fn update_member(
        &self,
        caller: &Principal,
        project_id: i64,
        user_id: i64,
        req: UpdateMemberRequest,
    ) -> PdmsResult<ProjectMember> {
        self.access.require_project_manage(caller, project_id).await?;
        let role = ProjectRole::parse(&req.role)?;

        let member = self.members.update_role(project_id, user_id, role).await?;
        info!(
            target: "audit",
            actor = caller.id,
            project_id,
            user_id,
            role = role.as_str(),
            "member role changed"
        );
        Ok(member)
    }

    pub async fn remove_member(&self, caller: &Principal, project_id: i64, user_id: i64) -> PdmsResult<()> {
        self.access.require_project_manage(caller, project_id).await?;
        self.members.remove(project_id, user_id).await?;
        self.projects.touch(project_id).await?;

        info!(target: "audit", actor = caller.id, project_id, user_id, "member removed");
        Ok(())
    }

    pub async fn available_users(&self, caller: &Principal, project_id: i64) -> PdmsResult<Vec<UserSummary>> {
        self.access.require_project_manage(caller, project_id).await?;
        self.members.available_users(project_id).await
    }

    async fn summary(&self, id: i64) -> PdmsResult<ProjectSummary> {
        self.projects
            .summary(id)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Project", id))
    }
}
