// src/api/mod.rs
// REST API: error mapping, extractors and HTTP routes

pub mod error;
pub mod extract;
pub mod http;

pub use error::{ApiError, ApiResult};
pub use http::build_router;
