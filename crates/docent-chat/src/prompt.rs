//! Chat prompt templates rendered for completion-style models.
//!
//! A template is an ordered list of messages: fixed system text, a slot where
//! the chat history is spliced in, and the human turn. Rendering produces one
//! line block per message, prefixed with the speaker:
//!
//! ```text
//! System: <instruction>
//! Human: <earlier question>
//! AI: <earlier answer>
//! Human: <input>
//! ```

use docent_core::types::{ChatTurn, Role, TurnKind};

/// Stand-in text for image turns, which completion models cannot read.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

#[derive(Debug, Clone, PartialEq)]
enum PromptMessage {
    System(String),
    History,
    Human(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptTemplate {
    messages: Vec<PromptMessage>,
}

impl PromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.messages.push(PromptMessage::System(text.into()));
        self
    }

    /// Slot for the chat history.
    pub fn history(mut self) -> Self {
        self.messages.push(PromptMessage::History);
        self
    }

    pub fn human(mut self, text: impl Into<String>) -> Self {
        self.messages.push(PromptMessage::Human(text.into()));
        self
    }

    pub fn render(&self, history: &[ChatTurn]) -> String {
        let mut lines = Vec::new();
        for message in &self.messages {
            match message {
                PromptMessage::System(text) => lines.push(format!("System: {}", text)),
                PromptMessage::Human(text) => lines.push(format!("Human: {}", text)),
                PromptMessage::History => lines.extend(history.iter().map(render_turn)),
            }
        }
        lines.join("\n")
    }
}

fn render_turn(turn: &ChatTurn) -> String {
    let speaker = match turn.role {
        Role::User => "Human",
        Role::Assistant => "AI",
    };
    let content = match turn.kind {
        TurnKind::Text => turn.content.as_str(),
        TurnKind::Image => IMAGE_PLACEHOLDER,
    };
    format!("{}: {}", speaker, content)
}
