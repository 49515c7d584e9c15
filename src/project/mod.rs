// src/project/mod.rs
// Projects and their members

pub mod members;
pub mod service;
pub mod store;
pub mod types;

pub use members::MemberStore;
pub use service::ProjectService;
pub use store::{ProjectFilter, ProjectStore};
pub use types::{
    AddMemberRequest, CreateProjectRequest, Project, ProjectListParams, ProjectMember,
    ProjectRole, ProjectStatus, ProjectSummary, UpdateMemberRequest, UpdateProjectRequest,
};
