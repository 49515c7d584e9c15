// src/storage.rs
// Document file storage rooted at a single directory

use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PdmsError, PdmsResult};

/// Stores uploaded files under `root`. Every path handed in is relative and
/// must stay inside the root after resolution.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative storage path, rejecting absolute paths and `..`
    pub fn resolve(&self, relative: &str) -> PdmsResult<PathBuf> {
        let path = Path::new(relative);
        if relative.trim().is_empty() {
            return Err(PdmsError::invalid("Storage path is empty"));
        }

        let mut resolved = self.root.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(PdmsError::invalid(format!(
                        "Storage path escapes the storage root: {}",
                        relative
                    )));
                }
            }
        }

        if !resolved.starts_with(&self.root) {
            return Err(PdmsError::invalid(format!(
                "Storage path escapes the storage root: {}",
                relative
            )));
        }
        Ok(resolved)
    }

    /// Write bytes to `relative`, creating parent directories on demand
    pub async fn store(&self, relative: &str, bytes: &[u8]) -> PdmsResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target and rename so readers never see a partial file
        let temp = path.with_file_name(format!(
            ".{}.{}.tmp",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("upload"),
            Uuid::new_v4()
        ));
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), size = bytes.len(), "stored file");
        Ok(path)
    }

    pub async fn read(&self, relative: &str) -> PdmsResult<Vec<u8>> {
        let path = self.resolve(relative)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PdmsError::not_found(
                format!("Stored file not found: {}", relative),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Open a stored file for streaming, returning it with its length
    pub async fn open(&self, relative: &str) -> PdmsResult<(tokio::fs::File, u64)> {
        let path = self.resolve(relative)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdmsError::not_found(format!("Stored file not found: {}", relative)));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Deleting a file that is already gone is not an error
    pub async fn delete(&self, relative: &str) -> PdmsResult<()> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn create_dir(&self, relative: &str) -> PdmsResult<PathBuf> {
        let path = self.resolve(relative)?;
        tokio::fs::create_dir_all(&path).await?;
        Ok(path)
    }

    /// Remove a directory tree; a missing directory is fine
    pub async fn remove_dir(&self, relative: &str) -> PdmsResult<()> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove directory");
                Err(e.into())
            }
        }
    }
}

pub fn project_dir(project_id: i64) -> String {
    format!("projects/{}", project_id)
}

pub fn folder_dir(project_id: i64, folder_id: i64) -> String {
    format!("projects/{}/{}", project_id, folder_id)
}

/// `projects/{p}/{f}/{doc}_v{n}_{file}`
pub fn version_path(
    project_id: i64,
    folder_id: i64,
    document_id: i64,
    version: i64,
    filename: &str,
) -> String {
    format!(
        "{}/{}_v{}_{}",
        folder_dir(project_id, folder_id),
        document_id,
        version,
        sanitize_filename(filename)
    )
}

/// Keep letters, digits, `.`, `-` and `_`; everything else becomes `_`
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_rejects_escapes() {
        let storage = FileSystemStorage::new("/srv/pdms");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("projects/1/../../x").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
        assert_eq!(
            storage.resolve("projects/1/2/3_v1_a.txt").unwrap(),
            PathBuf::from("/srv/pdms/projects/1/2/3_v1_a.txt")
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report final.pdf"), "report_final.pdf");
        assert_eq!(sanitize_filename("../../secret.txt"), "secret.txt");
        assert_eq!(sanitize_filename("C:\\docs\\plan.docx"), "plan.docx");
        assert_eq!(sanitize_filename("..."), "file");
        assert_eq!(version_path(1, 2, 3, 4, "a b.txt"), "projects/1/2/3_v4_a_b.txt");
    }

    #[tokio::test]
    async fn test_store_read_delete() {
        let dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(dir.path());

        storage.store("projects/1/2/doc.txt", b"hello").await.unwrap();
        assert_eq!(storage.read("projects/1/2/doc.txt").await.unwrap(), b"hello");

        storage.delete("projects/1/2/doc.txt").await.unwrap();
        // already gone
        storage.delete("projects/1/2/doc.txt").await.unwrap();
        assert!(matches!(
            storage.read("projects/1/2/doc.txt").await,
            Err(PdmsError::NotFound(_))
        ));

        storage.remove_dir("projects/1").await.unwrap();
        assert!(!dir.path().join("projects/1").exists());
        storage.remove_dir("projects/1").await.unwrap();
    }

    #[tokio::test]
    async fn test_open_for_streaming() {
        use tokio::io::AsyncReadExt;

        let dir = TempDir::new().unwrap();
        let storage = FileSystemStorage::new(dir.path());
        storage.store("projects/1/2/plan.txt", b"level 1").await.unwrap();

        let (mut file, len) = storage.open("projects/1/2/plan.txt").await.unwrap();
        assert_eq!(len, 7);
        let mut contents = String::new();
        file.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "level 1");

        assert!(matches!(
            storage.open("projects/1/2/missing.txt").await,
            Err(PdmsError::NotFound(_))
        ));
        assert!(storage.open("../outside.txt").await.is_err());
    }
}
