// src/chatbot/store.rs
// Conversation, message and reference persistence

use chrono::Utc;
use sqlx::SqlitePool;

use super::types::{HistoryMessage, MessageReference, MessageRow, MessageType, SourceRef};
use crate::error::PdmsResult;

pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a question and its answer to the caller's latest conversation
    /// for the scope (a project, or global when `None`). Returns the ids of
    /// the user and bot messages.
    pub async fn record(
        &self,
        user_id: i64,
        project_id: Option<i64>,
        question: &str,
        answer: &str,
        sources: &[SourceRef],
    ) -> PdmsResult<(i64, i64)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM chatbot_conversations
            WHERE user_id = ? AND project_id IS ?
            ORDER BY last_message_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;

        let conversation_id = match existing {
            Some(id) => id,
            None => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO chatbot_conversations (user_id, project_id, started_at, last_message_at)
                    VALUES (?, ?, ?, ?)
                    RETURNING id
                    "#,
                )
                .bind(user_id)
                .bind(project_id)
                .bind(now)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let mut ids = [0i64; 2];
        for (slot, (kind, content)) in [(MessageType::User, question), (MessageType::Bot, answer)]
            .into_iter()
            .enumerate()
        {
            ids[slot] = sqlx::query_scalar(
                r#"
                INSERT INTO chatbot_messages (conversation_id, message_type, content, sent_at)
                VALUES (?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(conversation_id)
            .bind(kind.as_str())
            .bind(content)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE chatbot_conversations SET last_message_at = ? WHERE id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        // Sources whose document has since been deleted are skipped
        for source in sources {
            sqlx::query(
                r#"
                INSERT INTO chatbot_references (message_id, document_id, relevance_score)
                SELECT ?, id, ? FROM documents WHERE id = ?
                "#,
            )
            .bind(ids[1])
            .bind(source.relevance_score)
            .bind(source.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok((ids[0], ids[1]))
    }

    /// The newest `limit` messages of the scope, oldest first
    pub async fn history(
        &self,
        user_id: i64,
        project_id: Option<i64>,
        limit: u32,
    ) -> PdmsResult<Vec<HistoryMessage>> {
        let mut rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.message_type, m.content, m.sent_at
            FROM chatbot_messages m
            JOIN chatbot_conversations c ON c.id = m.conversation_id
            WHERE c.user_id = ? AND c.project_id IS ?
            ORDER BY m.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.reverse();

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let references = sqlx::query_as::<_, MessageReference>(
                r#"
                SELECT r.document_id, d.name AS document_name, r.relevance_score
                FROM chatbot_references r
                JOIN documents d ON d.id = r.document_id
                WHERE r.message_id = ?
                ORDER BY r.id
                "#,
            )
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;

            messages.push(HistoryMessage {
                id: row.id,
                message_type: row.message_type,
                content: row.content,
                sent_at: row.sent_at,
                references,
            });
        }
        Ok(messages)
    }
}
