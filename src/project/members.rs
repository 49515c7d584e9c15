// src/project/members.rs
// Project membership persistence with the last-project-manager guard

use chrono::Utc;
use sqlx::SqlitePool;

use super::types::{ProjectMember, ProjectRole};
use crate::error::{PdmsError, PdmsResult};
use crate::users::UserSummary;

const LAST_MANAGER: &str = "Cannot remove the last project manager";

pub struct MemberStore {
    pool: SqlitePool,
}

impl MemberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, project_id: i64) -> PdmsResult<Vec<ProjectMember>> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT pm.user_id, u.name AS user_name, u.email AS user_email, pm.role, pm.added_at
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = ?
            ORDER BY pm.added_at, pm.user_id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn get(&self, project_id: i64, user_id: i64) -> PdmsResult<Option<ProjectMember>> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT pm.user_id, u.name AS user_name, u.email AS user_email, pm.role, pm.added_at
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = ? AND pm.user_id = ?
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    /// The member's role, or None when the user is not a member
    pub async fn role_of(&self, project_id: i64, user_id: i64) -> PdmsResult<Option<ProjectRole>> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        role.map(|r| ProjectRole::parse(&r)).transpose()
    }

    pub async fn add(
        &self,
        project_id: i64,
        user_id: i64,
        role: ProjectRole,
        added_by: i64,
    ) -> PdmsResult<ProjectMember> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO project_members (project_id, user_id, role, added_at, added_by)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(Utc::now())
        .bind(added_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PdmsError::conflict("User is already a member of this project"));
        }

        self.get(project_id, user_id)
            .await?
            .ok_or_else(|| PdmsError::internal("Member vanished after insert"))
    }

    /// Change a member's role. Demoting the only project manager is rejected.
    pub async fn update_role(
        &self,
        project_id: i64,
        user_id: i64,
        role: ProjectRole,
    ) -> PdmsResult<ProjectMember> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> = sqlx::query_scalar(
            "SELECT role FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current
            .ok_or_else(|| PdmsError::not_found("User is not a member of this project"))?;

        if current == ProjectRole::ProjectManager.as_str() && role != ProjectRole::ProjectManager {
            let managers = count_managers(&mut tx, project_id).await?;
            if managers <= 1 {
                return Err(PdmsError::invalid(LAST_MANAGER));
            }
        }

        sqlx::query("UPDATE project_members SET role = ? WHERE project_id = ? AND user_id = ?")
            .bind(role.as_str())
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get(project_id, user_id)
            .await?
            .ok_or_else(|| PdmsError::internal("Member vanished after update"))
    }

    /// Remove a member. Removing the only project manager is rejected.
    pub async fn remove(&self, project_id: i64, user_id: i64) -> PdmsResult<()> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> = sqlx::query_scalar(
            "SELECT role FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current
            .ok_or_else(|| PdmsError::not_found("User is not a member of this project"))?;

        if current == ProjectRole::ProjectManager.as_str() {
            let managers = count_managers(&mut tx, project_id).await?;
            if managers <= 1 {
                return Err(PdmsError::invalid(LAST_MANAGER));
            }
        }

        sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Users who are not members of the project, by name
    pub async fn available_users(&self, project_id: i64) -> PdmsResult<Vec<UserSummary>> {
        let rows: Vec<(i64, String, String)> = sqlx::query_as(
            r#"
            SELECT u.id, u.name, u.email
            FROM users u
            WHERE u.id NOT IN (SELECT user_id FROM project_members WHERE project_id = ?)
            ORDER BY u.name COLLATE NOCASE, u.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email)| UserSummary { id, name, email })
            .collect())
    }
}

async fn count_managers(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    project_id: i64,
) -> PdmsResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM project_members WHERE project_id = ? AND role = ?",
    )
    .bind(project_id)
    .bind(ProjectRole::ProjectManager.as_str())
    .fetch_one(&mut **tx)
    .await?;
    Ok(count)
}
