// src/chatbot/context.rs
// Question routing, context assembly and citation parsing

use lazy_static::lazy_static;
use regex::Regex;

use crate::indexing::IndexedDocument;

/// Upper bound on the rendered context, in characters
pub const MAX_CONTEXT_CHARS: usize = 8000;

const DOCUMENT_PREFIX: &str = "Document: ";
const CONTENT_PREFIX: &str = "\nContent: ";
const ENTRY_SUFFIX: &str = "\n\n";

lazy_static! {
    static ref DOCUMENT_ABOUT: Regex =
        Regex::new(r#"(?i)document\s+["']?([^"']+)["']?\s+about"#).expect("valid title pattern");
    static ref CONTENT_OF_DOCUMENT: Regex =
        Regex::new(r#"(?i)content\s+of\s+document\s+["']?([^"']+)["']?"#).expect("valid title pattern");
    static ref CITATION: Regex = Regex::new(r"\[doc_(\d+)\]").expect("valid citation pattern");
}

/// The document a question explicitly names, if any
pub fn extract_document_title(question: &str) -> Option<String> {
    [&*DOCUMENT_ABOUT, &*CONTENT_OF_DOCUMENT]
        .into_iter()
        .find_map(|re| re.captures(question))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Distinct `[doc_N]` ids in order of first appearance
pub fn extract_citations(answer: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for caps in CITATION.captures_iter(answer) {
        if let Ok(id) = caps[1].parse::<i64>() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Documents selected for a question, with text already cut to fit
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    documents: Vec<IndexedDocument>,
}

impl ChatContext {
    pub fn build(docs: Vec<IndexedDocument>) -> Self {
        let mut remaining = MAX_CONTEXT_CHARS;
        let mut documents = Vec::new();

        for mut doc in docs {
            if doc.text.trim().is_empty() {
                continue;
            }

            let overhead = DOCUMENT_PREFIX.len()
                + doc.name.chars().count()
                + CONTENT_PREFIX.len()
                + ENTRY_SUFFIX.len();
            if overhead >= remaining {
                break;
            }

            let budget = remaining - overhead;
            let text_len = doc.text.chars().count();
            let truncated = text_len > budget;
            if truncated {
                doc.text = doc.text.chars().take(budget).collect();
            }

            remaining -= overhead + doc.text.chars().count();
            documents.push(doc);
            if truncated {
                break;
            }
        }

        Self { documents }
    }

    pub fn single(doc: IndexedDocument) -> Self {
        Self::build(vec![doc])
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    pub fn name_of(&self, document_id: i64) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.document_id == document_id)
            .map(|d| d.name.as_str())
    }

    /// `Document: <name>\nContent: <text>\n\n` per document; the layout the
    /// character budget is measured against
    #[cfg(test)]
    fn render(&self) -> String {
        let mut out = String::new();
        for doc in &self.documents {
            out.push_str(DOCUMENT_PREFIX);
            out.push_str(&doc.name);
            out.push_str(CONTENT_PREFIX);
            out.push_str(&doc.text);
            out.push_str(ENTRY_SUFFIX);
        }
        out
    }

    /// The citable form sent to the provider: `[doc_<id>]: <text>`
    pub fn references(&self) -> String {
        let mut out = String::from("Here is the context to use for answering the question:\n\n");
        for doc in &self.documents {
            out.push_str(&format!("[doc_{}]: {}\n\n", doc.document_id, doc.text));
        }
        out
    }
}
