// src/document/store.rs

use chrono::Utc;
use sqlx::SqlitePool;

use super::types::{DocumentRow, VersionRow};
use crate::error::{PdmsError, PdmsResult};

const DOCUMENT_SELECT: &str = r#"
    SELECT d.id, d.folder_id, d.name, d.mime_type, d.size, d.created_at, d.display_order,
           (SELECT COUNT(*) FROM document_versions v WHERE v.document_id = d.id) AS version_count,
           (SELECT MAX(v.version_number) FROM document_versions v WHERE v.document_id = d.id) AS latest_version_number,
           u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
    FROM documents d
    LEFT JOIN users u ON u.id = d.created_by
"#;

const VERSION_SELECT: &str = r#"
    SELECT v.id, v.document_id, v.version_number, v.storage_path, v.size, v.created_at,
           dc.embedding_status,
           u.id AS creator_id, u.name AS creator_name, u.email AS creator_email
    FROM document_versions v
    LEFT JOIN document_content dc ON dc.document_version_id = v.id
    LEFT JOIN users u ON u.id = v.created_by
"#;

pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> PdmsResult<Option<DocumentRow>> {
        let sql = format!("{} WHERE d.id = ?", DOCUMENT_SELECT);
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn require(&self, id: i64) -> PdmsResult<DocumentRow> {
        self.get(id)
            .await?
            .ok_or_else(|| PdmsError::entity_not_found("Document", id))
    }

    pub async fn by_folder(&self, folder_id: i64) -> PdmsResult<Vec<DocumentRow>> {
        let sql = format!(
            "{} WHERE d.folder_id = ? ORDER BY d.display_order, d.name, d.id",
            DOCUMENT_SELECT
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(folder_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn by_project(&self, project_id: i64) -> PdmsResult<Vec<DocumentRow>> {
        let sql = format!(
            "{} JOIN folders f ON f.id = d.folder_id WHERE f.project_id = ? ORDER BY d.display_order, d.name, d.id",
            DOCUMENT_SELECT
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(
        &self,
        folder_id: i64,
        name: &str,
        mime_type: &str,
        size: i64,
        created_by: i64,
    ) -> PdmsResult<i64> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO documents (folder_id, name, mime_type, size, created_by, created_at, display_order)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            RETURNING id
            "#,
        )
        .bind(folder_id)
        .bind(name)
        .bind(mime_type)
        .bind(size)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Number the next version would get
    pub async fn next_version_number(&self, document_id: i64) -> PdmsResult<i64> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version_number) FROM document_versions WHERE document_id = ?",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// Record a stored version; a concurrent upload that took the same
    /// number surfaces as a conflict
    pub async fn add_version(
        &self,
        document_id: i64,
        version_number: i64,
        storage_path: &str,
        size: i64,
        created_by: i64,
    ) -> PdmsResult<i64> {
        let result = sqlx::query_scalar(
            r#"
            INSERT INTO document_versions (document_id, version_number, storage_path, size, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(document_id)
        .bind(version_number)
        .bind(storage_path)
        .bind(size)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(PdmsError::conflict(
                format!("Version {} of document {} already exists", version_number, document_id),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Size and type always describe the newest version
    pub async fn update_file_info(&self, document_id: i64, mime_type: &str, size: i64) -> PdmsResult<()> {
        sqlx::query("UPDATE documents SET mime_type = ?, size = ? WHERE id = ?")
            .bind(mime_type)
            .bind(size)
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn versions(&self, document_id: i64) -> PdmsResult<Vec<VersionRow>> {
        let sql = format!(
            "{} WHERE v.document_id = ? ORDER BY v.version_number",
            VERSION_SELECT
        );
        let rows = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn latest_version(&self, document_id: i64) -> PdmsResult<Option<VersionRow>> {
        let sql = format!(
            "{} WHERE v.document_id = ? ORDER BY v.version_number DESC LIMIT 1",
            VERSION_SELECT
        );
        let row = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_version(&self, version_id: i64) -> PdmsResult<()> {
        sqlx::query("DELETE FROM document_versions WHERE id = ?")
            .bind(version_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> PdmsResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
