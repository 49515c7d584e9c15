// src/state.rs
// Shared application state: stores and services wired over one pool

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::access::AccessControl;
use crate::auth::{AuthService, TokenSigner};
use crate::chatbot::{ChatProvider, ChatbotService, ConversationStore, OpenAiChatProvider};
use crate::config::PdmsConfig;
use crate::document::{DocumentService, DocumentStore};
use crate::folder::{FolderService, FolderStore};
use crate::indexing::{ContentStore, Indexer};
use crate::project::{MemberStore, ProjectService, ProjectStore};
use crate::storage::FileSystemStorage;
use crate::users::{RoleStore, UserService, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<PdmsConfig>,

    // -------- Services --------
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub project_service: Arc<ProjectService>,
    pub folder_service: Arc<FolderService>,
    pub document_service: Arc<DocumentService>,
    pub indexer: Arc<Indexer>,
    pub chatbot_service: Arc<ChatbotService>,
}

impl AppState {
    /// Build state with the chat provider described by the configuration,
    /// or none when no API key is set
    pub fn from_config(pool: SqlitePool, config: PdmsConfig) -> anyhow::Result<Self> {
        let provider: Option<Arc<dyn ChatProvider>> = if config.openai.is_configured() {
            let provider = OpenAiChatProvider::new(&config.openai)?;
            info!(model = provider.name(), "chat provider configured");
            Some(Arc::new(provider))
        } else {
            warn!("OPENAI_API_KEY not set; chatbot answers will report that it is not configured");
            None
        };

        Ok(Self::new(pool, config, provider))
    }

    pub fn new(pool: SqlitePool, config: PdmsConfig, provider: Option<Arc<dyn ChatProvider>>) -> Self {
        let storage = Arc::new(FileSystemStorage::new(&config.storage.root_dir));

        let users = Arc::new(UserStore::new(pool.clone()));
        let roles = Arc::new(RoleStore::new(pool.clone()));
        let projects = Arc::new(ProjectStore::new(pool.clone()));
        let members = Arc::new(MemberStore::new(pool.clone()));
        let folders = Arc::new(FolderStore::new(pool.clone()));
        let documents = Arc::new(DocumentStore::new(pool.clone()));
        let content = Arc::new(ContentStore::new(pool.clone()));
        let conversations = Arc::new(ConversationStore::new(pool.clone()));

        let access = Arc::new(AccessControl::new(pool.clone(), members.clone()));

        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            TokenSigner::new(&config.auth),
        ));
        let user_service = Arc::new(UserService::new(
            users.clone(),
            roles,
            config.auth.bcrypt_cost,
        ));
        let project_service = Arc::new(ProjectService::new(
            projects.clone(),
            members,
            users,
            access.clone(),
            storage.clone(),
        ));
        let folder_service = Arc::new(FolderService::new(
            folders.clone(),
            access.clone(),
            storage.clone(),
        ));
        let indexer = Arc::new(Indexer::new(content.clone(), storage.clone(), access.clone()));
        let document_service = Arc::new(DocumentService::new(
            documents,
            folders,
            projects,
            access.clone(),
            storage,
            indexer.clone(),
            config.storage.max_upload_bytes,
        ));
        let chatbot_service = Arc::new(ChatbotService::new(content, conversations, access, provider));

        Self {
            pool,
            config: Arc::new(config),
            auth_service,
            user_service,
            project_service,
            folder_service,
            document_service,
            indexer,
            chatbot_service,
        }
    }
}
