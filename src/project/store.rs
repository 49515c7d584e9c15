// src/project/store.rs

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::types::{Project, ProjectStatus, ProjectSummary};
use crate::error::{PdmsError, PdmsResult};
use crate::page::{Page, PageParams};
use crate::users::store::escape_like;

/// Filters applied to project listings
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub name: Option<String>,
    /// Restrict to projects this user is a member of
    pub member_id: Option<i64>,
}

pub struct ProjectStore {
    pool: SqlitePool,
}

impl ProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: i64,
    ) -> PdmsResult<Project> {
        let now = Utc::now();

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, status, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, description, status, created_by, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(ProjectStatus::Active.as_str())
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    pub async fn get(&self, id: i64) -> PdmsResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, status, created_by, created_at, updated_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    pub async fn require(&self, id: i64) -> PdmsResult<Project> {
        self.get(id)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Project", id))
    }

    pub async fn summary(&self, id: i64) -> PdmsResult<Option<ProjectSummary>> {
        let filter = ProjectFilter::default();
        let mut qb = summary_select();
        push_filters(&mut qb, &filter);
        qb.push(" AND p.id = ").push_bind(id);

        let summary = qb
            .build_query_as::<ProjectSummary>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(summary)
    }

    pub async fn list(
        &self,
        filter: &ProjectFilter,
        params: &PageParams,
    ) -> PdmsResult<Page<ProjectSummary>> {
        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM projects p");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = summary_select();
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY p.updated_at DESC, p.id DESC LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let content = qb
            .build_query_as::<ProjectSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(content, params, total))
    }

    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
        status: Option<ProjectStatus>,
    ) -> PdmsResult<Option<Project>> {
        let Some(mut project) = self.get(id).await? else {
            return Ok(None);
        };

        if let Some(name) = name {
            project.name = name.to_string();
        }
        if let Some(description) = description {
            project.description = Some(description.to_string());
        }
        if let Some(status) = status {
            project.status = status.as_str().to_string();
        }
        project.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE projects
            SET name = ?, description = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.status)
        .bind(project.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(project))
    }

    /// Bump `updated_at`, used when project content changes
    pub async fn touch(&self, id: i64) -> PdmsResult<()> {
        sqlx::query("UPDATE projects SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete the project row; members, folders, documents, versions,
    /// extracted content and conversations go with it via cascades.
    pub async fn delete(&self, id: i64) -> PdmsResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Folder self-references cascade too, but clearing documents first
        // keeps the delete order independent of tree depth.
        sqlx::query(
            "DELETE FROM documents WHERE folder_id IN (SELECT id FROM folders WHERE project_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

fn summary_select() -> QueryBuilder<'static, Sqlite> {
    QueryBuilder::new(
        r#"
        SELECT p.id, p.name, p.description, p.status,
               (SELECT COUNT(*) FROM documents d
                  JOIN folders f ON f.id = d.folder_id
                 WHERE f.project_id = p.id) AS document_count,
               p.created_at, p.updated_at
        FROM projects p
        "#,
    )
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProjectFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status.as_str());
    }

    if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        qb.push(" AND p.name LIKE ")
            .push_bind(format!("%{}%", escape_like(name)))
            .push(" ESCAPE '\\'");
    }

    if let Some(member_id) = filter.member_id {
        qb.push(
            " AND EXISTS (SELECT 1 FROM project_members pm WHERE pm.project_id = p.id AND pm.user_id = ",
        )
        .push_bind(member_id)
        .push(")");
    }
}
