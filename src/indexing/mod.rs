// src/indexing/mod.rs
// Text extraction for uploaded document versions

pub mod parser;
pub mod service;
pub mod store;

pub use service::Indexer;
pub use store::{ContentStore, EmbeddingStatus, IndexedDocument};
