// src/folder/mod.rs
// Per-project folder tree

pub mod service;
pub mod store;
pub mod types;

pub use service::FolderService;
pub use store::FolderStore;
pub use types::{CreateFolderRequest, FolderResponse, FolderRow};
