// src/chatbot/mod.rs
// Project-scoped and global Q&A over document text

pub mod context;
pub mod provider;
pub mod service;
pub mod store;
pub mod types;

pub use provider::{ChatMessage, ChatProvider, OpenAiChatProvider};
pub use service::ChatbotService;
pub use store::ConversationStore;
pub use types::{ChatAnswer, DocumentQuestionRequest, HistoryMessage, HistoryParams, QuestionRequest, SourceRef};
