//! Rewrites a follow-up question into a standalone retrieval query.

use std::sync::Arc;

use tracing::{debug, warn};

use docent_core::error::Result;
use docent_core::types::ChatTurn;

use crate::llm::GenerationModel;
use crate::prompt::PromptTemplate;

pub const CONTEXTUALIZE_INSTRUCTION: &str = "Given a chat history and the latest user input \
which might reference context in the chat history, formulate a standalone input which can be \
understood without the chat history. Do NOT respond to the input, just reformulate it if \
needed and otherwise return it as is.";

pub struct QueryContextualizer {
    model: Arc<dyn GenerationModel>,
}

impl QueryContextualizer {
    pub fn new(model: Arc<dyn GenerationModel>) -> Self {
        Self { model }
    }

    /// Standalone form of `input`. With no history the input is returned
    /// unchanged and the model is not called.
    pub async fn contextualize(&self, history: &[ChatTurn], input: &str) -> Result<String> {
        if history.is_empty() {
            return Ok(input.to_string());
        }

        let prompt = PromptTemplate::new()
            .system(CONTEXTUALIZE_INSTRUCTION)
            .history()
            .human(input)
            .render(history);

        let rewritten = self.model.generate(&prompt).await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            warn!("Contextualizer returned an empty query, using the raw input");
            return Ok(input.to_string());
        }

        debug!(input, query = rewritten, "Contextualized query");
        Ok(rewritten.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGeneration;
    use docent_core::error::DocentError;

    fn history() -> Vec<ChatTurn> {
        vec![
            ChatTurn::user("What is the Falcon engine?"),
            ChatTurn::assistant("A rocket engine."),
        ]
    }

    #[tokio::test]
    async fn test_empty_history_skips_model() {
        let model = Arc::new(ScriptedGeneration::default());
        let contextualizer = QueryContextualizer::new(model.clone());

        let query = contextualizer.contextualize(&[], "Hello there").await.unwrap();
        assert_eq!(query, "Hello there");
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rewrites_with_history() {
        let model = Arc::new(ScriptedGeneration::new(["  How much does the Falcon engine cost?\n"]));
        let contextualizer = QueryContextualizer::new(model.clone());

        let query = contextualizer
            .contextualize(&history(), "How much does it cost?")
            .await
            .unwrap();
        assert_eq!(query, "How much does the Falcon engine cost?");

        let prompt = &model.prompts()[0];
        assert!(prompt.starts_with("System: Given a chat history"));
        assert!(prompt.contains("Human: What is the Falcon engine?"));
        assert!(prompt.contains("AI: A rocket engine."));
        assert!(prompt.ends_with("Human: How much does it cost?"));
    }

    #[tokio::test]
    async fn test_blank_rewrite_falls_back_to_input() {
        let model = Arc::new(ScriptedGeneration::new(["   "]));
        let contextualizer = QueryContextualizer::new(model);
        let query = contextualizer.contextualize(&history(), "and then?").await.unwrap();
        assert_eq!(query, "and then?");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedGeneration::default());
        model.push_failure("offline");
        let contextualizer = QueryContextualizer::new(model);
        let err = contextualizer.contextualize(&history(), "q").await.unwrap_err();
        assert!(matches!(err, DocentError::Generation(_)));
    }
}
