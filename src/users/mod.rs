// src/users/mod.rs
// User accounts and global roles

pub mod service;
pub mod store;
pub mod types;
pub mod validator;

pub use service::UserService;
pub use store::{RoleStore, UserStore};
pub use types::{
    CreateUserRequest, EmailCheckParams, Role, RoleName, UpdateUserRequest, UserResponse,
    UserRow, UserSearchParams, UserSummary,
};
