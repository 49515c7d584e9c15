// src/folder/store.rs

use chrono::Utc;
use sqlx::SqlitePool;

use super::types::FolderRow;
use crate::error::{PdmsError, PdmsResult};

const FOLDER_SELECT: &str = r#"
    SELECT f.id, f.project_id, f.parent_folder_id, f.name, f.created_at, f.display_order,
           EXISTS (SELECT 1 FROM folders c WHERE c.parent_folder_id = f.id) AS has_subfolders,
           u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
    FROM folders f
    LEFT JOIN users u ON u.id = f.created_by
"#;

pub fn duplicate_name(name: &str) -> PdmsError {
    PdmsError::conflict(format!("Folder with name {} already exists at this location", name))
}

pub struct FolderStore {
    pool: SqlitePool,
}

impl FolderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> PdmsResult<Option<FolderRow>> {
        let sql = format!("{} WHERE f.id = ?", FOLDER_SELECT);
        let row = sqlx::query_as::<_, FolderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn require(&self, id: i64) -> PdmsResult<FolderRow> {
        self.get(id)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Folder", id))
    }

    pub async fn roots(&self, project_id: i64) -> PdmsResult<Vec<FolderRow>> {
        let sql = format!(
            "{} WHERE f.project_id = ? AND f.parent_folder_id IS NULL ORDER BY f.display_order, f.name",
            FOLDER_SELECT
        );
        let rows = sqlx::query_as::<_, FolderRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn children(&self, parent_id: i64) -> PdmsResult<Vec<FolderRow>> {
        let sql = format!(
            "{} WHERE f.parent_folder_id = ? ORDER BY f.display_order, f.name",
            FOLDER_SELECT
        );
        let rows = sqlx::query_as::<_, FolderRow>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Whether a sibling with exactly this name exists under `parent_id`
    /// (the project root when `None`)
    pub async fn sibling_exists(
        &self,
        project_id: i64,
        parent_id: Option<i64>,
        name: &str,
    ) -> PdmsResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM folders WHERE project_id = ? AND parent_folder_id IS ? AND name = ?",
        )
        .bind(project_id)
        .bind(parent_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn create(
        &self,
        project_id: i64,
        parent_id: Option<i64>,
        name: &str,
        created_by: i64,
    ) -> PdmsResult<FolderRow> {
        let result = sqlx::query_scalar(
            r#"
            INSERT INTO folders (project_id, parent_folder_id, name, created_by, created_at, display_order)
            VALUES (?, ?, ?, ?, ?, 0)
            RETURNING id
            "#,
        )
        .bind(project_id)
        .bind(parent_id)
        .bind(name)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        // A concurrent create can pass the sibling check; the unique index decides
        let id: i64 = match result {
            Ok(id) => id,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(duplicate_name(name));
            }
            Err(e) => return Err(e.into()),
        };

        self.require(id).await
    }

    pub async fn document_count(&self, id: i64) -> PdmsResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE folder_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete(&self, id: i64) -> PdmsResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ancestor chain from the root down to `id` inclusive
    pub async fn path(&self, id: i64) -> PdmsResult<Vec<FolderRow>> {
        let ids: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            WITH RECURSIVE chain(id, parent_folder_id, depth) AS (
                SELECT id, parent_folder_id, 0 FROM folders WHERE id = ?
                UNION ALL
                SELECT f.id, f.parent_folder_id, chain.depth + 1
                FROM folders f JOIN chain ON f.id = chain.parent_folder_id
                WHERE chain.depth < 1000
            )
            SELECT id, depth FROM chain ORDER BY depth DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut path = Vec::with_capacity(ids.len());
        for (folder_id, _) in ids {
            path.push(self.require(folder_id).await?);
        }
        Ok(path)
    }
}
