// src/document/service.rs
// Uploads, versions, downloads and deletion of project documents

use std::sync::Arc;

use tracing::{info, warn};

use super::store::DocumentStore;
use super::types::{
    DocumentResponse, DownloadedFile, NewDocument, UploadedFile, VersionResponse, detect_mime,
    stored_filename,
};
use crate::access::AccessControl;
use crate::auth::Principal;
use crate::error::{PdmsError, PdmsResult};
use crate::folder::FolderStore;
use crate::indexing::Indexer;
use crate::project::ProjectStore;
use crate::storage::{FileSystemStorage, version_path};

pub struct DocumentService {
    documents: Arc<DocumentStore>,
    folders: Arc<FolderStore>,
    projects: Arc<ProjectStore>,
    access: Arc<AccessControl>,
    storage: Arc<FileSystemStorage>,
    indexer: Arc<Indexer>,
    max_upload_bytes: usize,
}

impl DocumentService {
    pub fn new(
        documents: Arc<DocumentStore>,
        folders: Arc<FolderStore>,
        projects: Arc<ProjectStore>,
        access: Arc<AccessControl>,
        storage: Arc<FileSystemStorage>,
        indexer: Arc<Indexer>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            documents,
            folders,
            projects,
            access,
            storage,
            indexer,
            max_upload_bytes,
        }
    }

    pub async fn project_documents(&self, caller: &Principal, project_id: i64) -> PdmsResult<Vec<DocumentResponse>> {
        self.access.require_project_access(caller, project_id).await?;
        let rows = self.documents.by_project(project_id).await?;
        Ok(rows.into_iter().map(DocumentResponse::from).collect())
    }

    pub async fn folder_documents(&self, caller: &Principal, folder_id: i64) -> PdmsResult<Vec<DocumentResponse>> {
        self.access.require_folder_access(caller, folder_id).await?;
        let rows = self.documents.by_folder(folder_id).await?;
        Ok(rows.into_iter().map(DocumentResponse::from).collect())
    }

    pub async fn get(&self, caller: &Principal, id: i64) -> PdmsResult<DocumentResponse> {
        self.access.require_document_access(caller, id).await?;
        Ok(self.documents.require(id).await?.into())
    }

    /// Create a document with its first version and extract its text
    pub async fn upload(&self, caller: &Principal, upload: NewDocument) -> PdmsResult<DocumentResponse> {
        let file = self.validate_file(upload.file)?;
        let name = upload.name.trim();
        if name.is_empty() {
            return Err(PdmsError::invalid("Document name cannot be empty"));
        }
        let project_id = upload
            .project_id
            .ok_or_else(|| PdmsError::invalid("Project ID cannot be null"))?;

        self.access.require_project_access(caller, project_id).await?;

        let folder_id = upload
            .folder_id
            .ok_or_else(|| PdmsError::invalid("Documents must be uploaded to a folder"))?;
        let folder = self.folders.require(folder_id).await?;
        if folder.project_id != project_id {
            return Err(PdmsError::invalid("Folder does not belong to the specified project"));
        }

        let mime_type = detect_mime(&file.filename, file.content_type.as_deref());
        let size = file.bytes.len() as i64;
        let document_id = self
            .documents
            .create(folder_id, name, &mime_type, size, caller.id)
            .await?;

        if let Err(e) = self
            .store_version(project_id, folder_id, document_id, 1, &file, &mime_type, caller.id)
            .await
        {
            self.documents.delete(document_id).await?;
            return Err(e);
        }

        self.projects.touch(project_id).await?;
        info!(document_id, project_id, folder_id, size, mime_type = %mime_type, "document uploaded");
        Ok(self.documents.require(document_id).await?.into())
    }

    /// Store the file as version n+1 of an existing document
    pub async fn add_version(
        &self,
        caller: &Principal,
        document_id: i64,
        file: Option<UploadedFile>,
    ) -> PdmsResult<DocumentResponse> {
        let project_id = self.access.require_document_access(caller, document_id).await?;
        let file = self.validate_file(file)?;
        let document = self.documents.require(document_id).await?;

        let version = self.documents.next_version_number(document_id).await?;
        let mime_type = detect_mime(&file.filename, file.content_type.as_deref());
        self.store_version(project_id, document.folder_id, document_id, version, &file, &mime_type, caller.id)
            .await?;
        self.documents
            .update_file_info(document_id, &mime_type, file.bytes.len() as i64)
            .await?;

        self.projects.touch(project_id).await?;
        info!(document_id, version, "document version added");
        Ok(self.documents.require(document_id).await?.into())
    }

    pub async fn versions(&self, caller: &Principal, document_id: i64) -> PdmsResult<Vec<VersionResponse>> {
        self.access.require_document_access(caller, document_id).await?;
        let rows = self.documents.versions(document_id).await?;
        Ok(rows.into_iter().map(VersionResponse::from).collect())
    }

    pub async fn download(&self, caller: &Principal, document_id: i64) -> PdmsResult<DownloadedFile> {
        self.access.require_document_access(caller, document_id).await?;
        let document = self.documents.require(document_id).await?;
        let version = self
            .documents
            .latest_version(document_id)
            .await?
            .ok_or_else(|| PdmsError::not_found(format!("Document {} has no stored versions", document_id)))?;

        let (file, size) = self.storage.open(&version.storage_path).await?;
        Ok(DownloadedFile {
            filename: stored_filename(&version.storage_path),
            mime_type: document.mime_type,
            size,
            file,
        })
    }

    /// File removal failures are logged; the rows are deleted regardless
    pub async fn delete(&self, caller: &Principal, document_id: i64) -> PdmsResult<()> {
        let project_id = self.access.require_document_access(caller, document_id).await?;

        for version in self.documents.versions(document_id).await? {
            if let Err(e) = self.storage.delete(&version.storage_path).await {
                warn!(document_id, path = %version.storage_path, error = %e, "failed to delete document file");
            }
        }

        self.documents.delete(document_id).await?;
        self.projects.touch(project_id).await?;
        info!(target: "audit", actor = caller.id, document_id, project_id, "document deleted");
        Ok(())
    }

    fn validate_file(&self, file: Option<UploadedFile>) -> PdmsResult<UploadedFile> {
        let file = file.ok_or_else(|| PdmsError::invalid("File cannot be empty"))?;
        if file.bytes.is_empty() {
            return Err(PdmsError::invalid("File cannot be empty"));
        }
        if file.bytes.len() > self.max_upload_bytes {
            return Err(PdmsError::invalid(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_upload_bytes
            )));
        }
        Ok(file)
    }

    #[allow(clippy::too_many_arguments)]
    async fn store_version(
        &self,
        project_id: i64,
        folder_id: i64,
        document_id: i64,
        version: i64,
        file: &UploadedFile,
        mime_type: &str,
        created_by: i64,
    ) -> PdmsResult<()> {
        let path = version_path(project_id, folder_id, document_id, version, &file.filename);
        // Claim the version number before touching disk
        let version_id = self
            .documents
            .add_version(document_id, version, &path, file.bytes.len() as i64, created_by)
            .await?;

        if let Err(e) = self.storage.store(&path, &file.bytes).await {
            self.documents.delete_version(version_id).await?;
            return Err(e);
        }

        if let Err(e) = self.indexer.index_version(version_id, &path, mime_type).await {
            if let Err(cleanup) = self.storage.delete(&path).await {
                warn!(document_id, path = %path, error = %cleanup, "failed to remove orphaned file");
            }
            self.documents.delete_version(version_id).await?;
            return Err(e);
        }
        Ok(())
    }
}
