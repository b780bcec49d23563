//! Grounded answer generation.

use std::sync::Arc;

use docent_core::error::Result;
use docent_core::types::{ChatTurn, Chunk};

use crate::llm::GenerationModel;
use crate::prompt::PromptTemplate;

pub const SYSTEM_INSTRUCTION: &str = "You are an intelligent assistant. You can follow basic \
instructions, answer casual greetings, and use retrieved context when needed. Prioritize \
responding naturally to direct instructions or greetings, and only use context when it \
enhances the response.";

/// System message: the instruction followed by a `<Context>` block holding
/// the chunk texts separated by blank lines.
pub fn system_message(context: &[Chunk]) -> String {
    let joined = context
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\n\n\n<Context>{}\n\n</Context>", SYSTEM_INSTRUCTION, joined)
}

pub fn build_prompt(input: &str, history: &[ChatTurn], context: &[Chunk]) -> String {
    PromptTemplate::new()
        .system(system_message(context))
        .history()
        .human(input)
        .render(history)
}

pub struct AnswerComposer {
    model: Arc<dyn GenerationModel>,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn GenerationModel>) -> Self {
        Self { model }
    }

    /// One model call; the completion is returned verbatim.
    pub async fn compose(&self, input: &str, history: &[ChatTurn], context: &[Chunk]) -> Result<String> {
        self.model.generate(&build_prompt(input, history, context)).await
    }
}
