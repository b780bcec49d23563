//! Docent chat crate - retrieval-augmented conversation.
//!
//! A question flows through three components: the contextualizer rewrites
//! it into a standalone query using the chat history, the retriever pulls
//! matching chunks from the knowledge store, and the composer generates the
//! grounded answer. The session machine checkpoints the result per session
//! and the conversation agent is the facade the binary talks to.

pub mod agent;
pub mod composer;
pub mod contextualizer;
pub mod llm;
pub mod prompt;
pub mod retriever;
pub mod session;

pub use agent::{ConversationAgent, IngestReport};
pub use composer::AnswerComposer;
pub use contextualizer::QueryContextualizer;
pub use llm::{GenerationModel, OllamaGeneration, ScriptedGeneration};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
pub use session::{RagPipeline, SessionMachine};
