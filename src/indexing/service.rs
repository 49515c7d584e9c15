// src/indexing/service.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::parser::{ContentKind, extract_text};
use super::store::{ContentStore, EmbeddingStatus};
use crate::access::AccessControl;
use crate::auth::Principal;
use crate::error::PdmsResult;
use crate::storage::FileSystemStorage;

/// Extracts text from stored versions into `document_content`
pub struct Indexer {
    content: Arc<ContentStore>,
    storage: Arc<FileSystemStorage>,
    access: Arc<AccessControl>,
}

impl Indexer {
    pub fn new(
        content: Arc<ContentStore>,
        storage: Arc<FileSystemStorage>,
        access: Arc<AccessControl>,
    ) -> Self {
        Self {
            content,
            storage,
            access,
        }
    }

    /// Extraction failures are recorded as FAILED and never returned as errors
    pub async fn index_version(
        &self,
        version_id: i64,
        storage_path: &str,
        mime_type: &str,
    ) -> PdmsResult<EmbeddingStatus> {
        self.content.reset(version_id).await?;

        let Some(kind) = ContentKind::for_mime(mime_type) else {
            debug!(version_id, mime_type, "no text extractor for type");
            self.content.set_status(version_id, EmbeddingStatus::Failed).await?;
            return Ok(EmbeddingStatus::Failed);
        };

        self.content
            .set_status(version_id, EmbeddingStatus::Processing)
            .await?;

        let bytes = match self.storage.read(storage_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(version_id, error = %e, "stored file unreadable");
                self.content.set_status(version_id, EmbeddingStatus::Failed).await?;
                return Ok(EmbeddingStatus::Failed);
            }
        };

        // pdf-extract can panic on malformed input; a panicked task is a failed extraction
        let extracted = tokio::task::spawn_blocking(move || extract_text(kind, &bytes)).await;

        match extracted {
            Ok(Ok(text)) => {
                self.content.complete(version_id, &text).await?;
                debug!(version_id, chars = text.len(), "text extracted");
                Ok(EmbeddingStatus::Completed)
            }
            Ok(Err(e)) => {
                warn!(version_id, error = %e, "text extraction failed");
                self.content.set_status(version_id, EmbeddingStatus::Failed).await?;
                Ok(EmbeddingStatus::Failed)
            }
            Err(e) => {
                warn!(version_id, error = %e, "text extraction task aborted");
                self.content.set_status(version_id, EmbeddingStatus::Failed).await?;
                Ok(EmbeddingStatus::Failed)
            }
        }
    }

    /// Re-extract the newest version of every document in the project
    pub async fn reindex_project(&self, caller: &Principal, project_id: i64) -> PdmsResult<usize> {
        self.access.require_project_manage(caller, project_id).await?;

        let sources = self.content.latest_versions(project_id).await?;
        let mut reindexed = 0;
        for source in &sources {
            self.index_version(source.version_id, &source.storage_path, &source.mime_type)
                .await?;
            reindexed += 1;
        }

        info!(project_id, reindexed, "project reindexed");
        Ok(reindexed)
    }
}
