// src/indexing/store.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::error::PdmsResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl EmbeddingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingStatus::Pending => "PENDING",
            EmbeddingStatus::Processing => "PROCESSING",
            EmbeddingStatus::Completed => "COMPLETED",
            EmbeddingStatus::Failed => "FAILED",
        }
    }
}

/// Stored file of the newest version of a document
#[derive(Debug, Clone, FromRow)]
pub struct VersionSource {
    pub version_id: i64,
    pub storage_path: String,
    pub mime_type: String,
}

/// Extracted text of the newest indexed version of a document
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct IndexedDocument {
    pub document_id: i64,
    pub name: String,
    pub text: String,
}

pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reset (or create) the content row of a version to PENDING
    pub async fn reset(&self, version_id: i64) -> PdmsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO document_content (document_version_id, content_text, indexed_at, embedding_status)
            VALUES (?, NULL, NULL, ?)
            ON CONFLICT (document_version_id) DO UPDATE SET
                content_text = NULL,
                indexed_at = NULL,
                embedding_status = excluded.embedding_status
            "#,
        )
        .bind(version_id)
        .bind(EmbeddingStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_status(&self, version_id: i64, status: EmbeddingStatus) -> PdmsResult<()> {
        sqlx::query("UPDATE document_content SET embedding_status = ? WHERE document_version_id = ?")
            .bind(status.as_str())
            .bind(version_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn complete(&self, version_id: i64, text: &str) -> PdmsResult<()> {
        sqlx::query(
            r#"
            UPDATE document_content
            SET content_text = ?, indexed_at = ?, embedding_status = ?
            WHERE document_version_id = ?
            "#,
        )
        .bind(text)
        .bind(Utc::now())
        .bind(EmbeddingStatus::Completed.as_str())
        .bind(version_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Newest version of every document in the project
    pub async fn latest_versions(&self, project_id: i64) -> PdmsResult<Vec<VersionSource>> {
        let sources = sqlx::query_as::<_, VersionSource>(
            r#"
            SELECT v.id AS version_id, v.storage_path, d.mime_type
            FROM documents d
            JOIN folders f ON f.id = d.folder_id
            JOIN document_versions v ON v.document_id = d.id
            WHERE f.project_id = ?
              AND v.version_number = (
                  SELECT MAX(v2.version_number) FROM document_versions v2 WHERE v2.document_id = d.id
              )
            ORDER BY d.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sources)
    }

    /// Documents with extracted text, optionally limited to one project
    pub async fn indexed_documents(&self, project_id: Option<i64>) -> PdmsResult<Vec<IndexedDocument>> {
        let mut qb = indexed_select();
        if let Some(project_id) = project_id {
            qb.push(" AND f.project_id = ").push_bind(project_id);
        }
        qb.push(" ORDER BY d.id");

        let docs = qb
            .build_query_as::<IndexedDocument>()
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    /// Exact-name lookup, newest document first when names repeat
    pub async fn indexed_document_by_name(
        &self,
        project_id: Option<i64>,
        name: &str,
    ) -> PdmsResult<Option<IndexedDocument>> {
        let mut qb = indexed_select();
        qb.push(" AND d.name = ").push_bind(name.to_string());
        if let Some(project_id) = project_id {
            qb.push(" AND f.project_id = ").push_bind(project_id);
        }
        qb.push(" ORDER BY d.id DESC LIMIT 1");

        let doc = qb
            .build_query_as::<IndexedDocument>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }
}

fn indexed_select() -> QueryBuilder<'static, Sqlite> {
    QueryBuilder::new(
        r#"
        SELECT d.id AS document_id, d.name, dc.content_text AS text
        FROM documents d
        JOIN folders f ON f.id = d.folder_id
        JOIN document_versions v ON v.document_id = d.id
        JOIN document_content dc ON dc.document_version_id = v.id
        WHERE dc.embedding_status = 'COMPLETED'
          AND dc.content_text IS NOT NULL
          AND dc.content_text <> ''
          AND v.version_number = (
              SELECT MAX(v2.version_number)
              FROM document_versions v2
              JOIN document_content dc2 ON dc2.document_version_id = v2.id
              WHERE v2.document_id = d.id AND dc2.embedding_status = 'COMPLETED'
          )
        "#,
    )
}
