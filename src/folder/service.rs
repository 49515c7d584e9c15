// src/folder/service.rs

use std::sync::Arc;

use tracing::{info, warn};

use super::store::{FolderStore, duplicate_name};
use super::types::{CreateFolderRequest, FolderResponse, validate_folder_name};
use crate::access::AccessControl;
use crate::auth::Principal;
use crate::error::{PdmsError, PdmsResult};
use crate::storage::{FileSystemStorage, folder_dir};

pub struct FolderService {
    folders: Arc<FolderStore>,
    access: Arc<AccessControl>,
    storage: Arc<FileSystemStorage>,
}

impl FolderService {
    pub fn new(
        folders: Arc<FolderStore>,
        access: Arc<AccessControl>,
        storage: Arc<FileSystemStorage>,
    ) -> Self {
        Self {
            folders,
            access,
            storage,
        }
    }

    pub async fn root_folders(&self, caller: &Principal, project_id: i64) -> PdmsResult<Vec<FolderResponse>> {
        self.access.require_project_access(caller, project_id).await?;
        let rows = self.folders.roots(project_id).await?;
        Ok(rows.into_iter().map(FolderResponse::from).collect())
    }

    pub async fn subfolders(&self, caller: &Principal, folder_id: i64) -> PdmsResult<Vec<FolderResponse>> {
        self.access.require_folder_access(caller, folder_id).await?;
        let rows = self.folders.children(folder_id).await?;
        Ok(rows.into_iter().map(FolderResponse::from).collect())
    }

    pub async fn get(&self, caller: &Principal, folder_id: i64) -> PdmsResult<FolderResponse> {
        self.access.require_folder_access(caller, folder_id).await?;
        Ok(self.folders.require(folder_id).await?.into())
    }

    pub async fn path(&self, caller: &Principal, folder_id: i64) -> PdmsResult<Vec<FolderResponse>> {
        self.access.require_folder_access(caller, folder_id).await?;
        let rows = self.folders.path(folder_id).await?;
        Ok(rows.into_iter().map(FolderResponse::from).collect())
    }

    pub async fn create(&self, caller: &Principal, req: CreateFolderRequest) -> PdmsResult<FolderResponse> {
        self.access.require_project_access(caller, req.project_id).await?;
        let name = validate_folder_name(&req.name)?;

        if let Some(parent_id) = req.parent_folder_id {
            let parent = self.folders.require(parent_id).await?;
            if parent.project_id != req.project_id {
                return Err(PdmsError::invalid("Parent folder does not belong to the specified project"));
            }
        }

        if self
            .folders
            .sibling_exists(req.project_id, req.parent_folder_id, &name)
            .await?
        {
            return Err(duplicate_name(&name));
        }

        let folder = self
            .folders
            .create(req.project_id, req.parent_folder_id, &name, caller.id)
            .await?;

        if let Err(e) = self.storage.create_dir(&folder_dir(req.project_id, folder.id)).await {
            // Keep the tree consistent with disk
            self.folders.delete(folder.id).await?;
            return Err(e);
        }

        info!(folder_id = folder.id, project_id = req.project_id, "folder created");
        Ok(folder.into())
    }

    /// Only empty folders can be deleted
    pub async fn delete(&self, caller: &Principal, folder_id: i64) -> PdmsResult<()> {
        let project_id = self.access.require_folder_access(caller, folder_id).await?;

        if self.folders.document_count(folder_id).await? > 0 {
            return Err(PdmsError::conflict("Cannot delete folder that contains documents"));
        }
        if !self.folders.children(folder_id).await?.is_empty() {
            return Err(PdmsError::conflict("Cannot delete folder that contains subfolders"));
        }

        self.folders.delete(folder_id).await?;
        if let Err(e) = self.storage.remove_dir(&folder_dir(project_id, folder_id)).await {
            warn!(folder_id, error = %e, "folder directory left on disk");
        }
        info!(folder_id, project_id, "folder deleted");
        Ok(())
    }
}
