// src/auth/mod.rs

pub mod extractor;
pub mod jwt;
pub mod models;
pub mod password;
pub mod service;

pub use extractor::CurrentUser;
pub use jwt::{Claims, TokenSigner, TokenType};
pub use models::{JwtAuthResponse, LoginRequest, Principal, TokenRefreshRequest};
pub use password::{hash_password, verify_password};
pub use service::AuthService;
