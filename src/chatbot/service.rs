// src/chatbot/service.rs
// Question answering over extracted document text

use std::sync::Arc;

use tracing::{error, info};

use super::context::{ChatContext, extract_citations, extract_document_title};
use super::provider::{ChatMessage, ChatProvider};
use super::store::ConversationStore;
use super::types::{
    ChatAnswer, DEFAULT_HISTORY_LIMIT, HistoryMessage, MAX_HISTORY_LIMIT, MAX_QUESTION_CHARS,
    SourceRef,
};
use crate::access::AccessControl;
use crate::auth::Principal;
use crate::error::{PdmsError, PdmsResult};
use crate::indexing::ContentStore;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the provided context. \
If the answer is not in the context, say that you don't have enough information to answer the question. \
Keep your answers concise and to the point. \
You must cite your sources using [doc_id] notation when you use information from the context. \
Each document has a unique ID that you should include in your citations.";

pub const PROVIDER_ERROR_ANSWER: &str =
    "Sorry, there was an error processing your request. Please try again later.";
pub const NOT_CONFIGURED_ANSWER: &str =
    "The document assistant is not configured. Please ask an administrator to set up the chat provider.";

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 800;

pub struct ChatbotService {
    content: Arc<ContentStore>,
    conversations: Arc<ConversationStore>,
    access: Arc<AccessControl>,
    provider: Option<Arc<dyn ChatProvider>>,
}

impl ChatbotService {
    pub fn new(
        content: Arc<ContentStore>,
        conversations: Arc<ConversationStore>,
        access: Arc<AccessControl>,
        provider: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        Self {
            content,
            conversations,
            access,
            provider,
        }
    }

    /// Answer from every indexed document of the project, unless the
    /// question names a single document
    pub async fn ask_project(&self, caller: &Principal, project_id: i64, question: &str) -> PdmsResult<ChatAnswer> {
        self.access.require_project_access(caller, project_id).await?;
        let question = validate_question(question)?;

        if let Some(title) = extract_document_title(question) {
            return self.document_answer(caller, Some(project_id), &title, question).await;
        }

        let docs = self.content.indexed_documents(Some(project_id)).await?;
        let context = ChatContext::build(docs);
        self.answer_and_record(caller, Some(project_id), question, &context).await
    }

    pub async fn ask_document(
        &self,
        caller: &Principal,
        project_id: i64,
        document_name: &str,
        question: &str,
    ) -> PdmsResult<ChatAnswer> {
        self.access.require_project_access(caller, project_id).await?;
        let question = validate_question(question)?;
        let document_name = document_name.trim();
        if document_name.is_empty() {
            return Err(PdmsError::invalid("Document name is required"));
        }

        self.document_answer(caller, Some(project_id), document_name, question).await
    }

    /// Answer across all projects; limited to admins and directors
    pub async fn ask_global(&self, caller: &Principal, question: &str) -> PdmsResult<ChatAnswer> {
        self.access.require_admin_or_director(caller)?;
        let question = validate_question(question)?;

        if let Some(title) = extract_document_title(question) {
            return self.document_answer(caller, None, &title, question).await;
        }

        let docs = self.content.indexed_documents(None).await?;
        let context = ChatContext::build(docs);
        self.answer_and_record(caller, None, question, &context).await
    }

    pub async fn project_history(
        &self,
        caller: &Principal,
        project_id: i64,
        limit: Option<u32>,
    ) -> PdmsResult<Vec<HistoryMessage>> {
        self.access.require_project_access(caller, project_id).await?;
        let limit = validate_limit(limit)?;
        self.conversations.history(caller.id, Some(project_id), limit).await
    }

    /// The caller's own global conversation
    pub async fn global_history(&self, caller: &Principal, limit: Option<u32>) -> PdmsResult<Vec<HistoryMessage>> {
        let limit = validate_limit(limit)?;
        self.conversations.history(caller.id, None, limit).await
    }

    async fn document_answer(
        &self,
        caller: &Principal,
        project_id: Option<i64>,
        document_name: &str,
        question: &str,
    ) -> PdmsResult<ChatAnswer> {
        match self
            .content
            .indexed_document_by_name(project_id, document_name)
            .await?
        {
            Some(doc) => {
                let context = ChatContext::single(doc);
                self.answer_and_record(caller, project_id, question, &context).await
            }
            None => {
                let answer = ChatAnswer {
                    response: format!(
                        "Document '{}' not found or you don't have access to it.",
                        document_name
                    ),
                    sources: Vec::new(),
                };
                self.conversations
                    .record(caller.id, project_id, question, &answer.response, &[])
                    .await?;
                Ok(answer)
            }
        }
    }

    async fn answer_and_record(
        &self,
        caller: &Principal,
        project_id: Option<i64>,
        question: &str,
        context: &ChatContext,
    ) -> PdmsResult<ChatAnswer> {
        let answer = self.answer(question, context).await;
        self.conversations
            .record(caller.id, project_id, question, &answer.response, &answer.sources)
            .await?;

        info!(
            user_id = caller.id,
            project_id = ?project_id,
            documents = context.documents().len(),
            sources = answer.sources.len(),
            "question answered"
        );
        Ok(answer)
    }

    /// Provider failures become a fixed apology; they are never returned as errors
    async fn answer(&self, question: &str, context: &ChatContext) -> ChatAnswer {
        let Some(provider) = self.provider.as_ref() else {
            return ChatAnswer {
                response: NOT_CONFIGURED_ANSWER.to_string(),
                sources: Vec::new(),
            };
        };

        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        if !context.is_empty() {
            messages.push(ChatMessage::system(context.references()));
        }
        messages.push(ChatMessage::user(question));

        match provider.complete(&messages, TEMPERATURE, MAX_TOKENS).await {
            Ok(response) => {
                let sources = extract_citations(&response)
                    .into_iter()
                    .filter_map(|id| {
                        context.name_of(id).map(|name| SourceRef {
                            id,
                            name: name.to_string(),
                            relevance_score: 1.0,
                        })
                    })
                    .collect();
                ChatAnswer { response, sources }
            }
            Err(e) => {
                error!(provider = provider.name(), error = %e, "chat completion failed");
                ChatAnswer {
                    response: PROVIDER_ERROR_ANSWER.to_string(),
                    sources: Vec::new(),
                }
            }
        }
    }
}

fn validate_question(question: &str) -> PdmsResult<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(PdmsError::invalid("Question is required"));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(PdmsError::invalid(format!(
            "Question cannot exceed {} characters",
            MAX_QUESTION_CHARS
        )));
    }
    Ok(question)
}

fn validate_limit(limit: Option<u32>) -> PdmsResult<u32> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
        return Err(PdmsError::invalid(format!(
            "limit must be between 1 and {}",
            MAX_HISTORY_LIMIT
        )));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_validation() {
        assert_eq!(validate_question("  hi  ").unwrap(), "hi");
        assert!(validate_question("   ").is_err());
        assert!(validate_question(&"q".repeat(MAX_QUESTION_CHARS + 1)).is_err());
    }

    #[test]
    fn test_limit_validation() {
        assert_eq!(validate_limit(None).unwrap(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(validate_limit(Some(100)).unwrap(), 100);
        assert!(validate_limit(Some(0)).is_err());
        assert!(validate_limit(Some(101)).is_err());
    }
}
