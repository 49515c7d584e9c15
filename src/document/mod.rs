// src/document/mod.rs
// Documents, their stored versions and downloads

pub mod service;
pub mod store;
pub mod types;

pub use service::DocumentService;
pub use store::DocumentStore;
pub use types::{DocumentResponse, DownloadedFile, NewDocument, UploadedFile, VersionResponse};
