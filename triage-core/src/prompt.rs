//! Prompt construction
//!
//! Combines a decoded batch and the knowledge base into a single instruction
//! for the reasoning model. Pure: the same inputs always give the same text.

use crate::domain::knowledge::KnowledgeBase;
use crate::domain::log::LogBatch;

/// Inference prompt text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn build(batch: &LogBatch, knowledge: &KnowledgeBase) -> Self {
        let logs = batch.joined_messages();
        let knowledge = knowledge.to_json();

        Self(format!(
            "\n\nHuman: The following are logs from a system:\n\
             Logs: {logs}\n\
             \n\
             Use the knowledge base below to analyze the logs and recommend actions:\n\
             Knowledge Base: {knowledge}\n\
             \n\
             Respond with the severity of the issue and recommended action.\n\
             \n\
             \n\nAssistant:"
        ))
    }

    /// Wraps already-rendered text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
