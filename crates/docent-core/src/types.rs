use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Chat history
// =============================================================================

/// Who produced a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Payload kind of a chat turn.
///
/// The pipeline only produces `Text`. `Image` turns are inserted by a UI and
/// carry an image reference in `content`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    #[default]
    Text,
    Image,
}

/// One message in a conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub kind: TurnKind,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            kind: TurnKind::Text,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered sequence of turns belonging to one session.
pub type ChatHistory = Vec<ChatTurn>;

// =============================================================================
// Chunks
// =============================================================================

/// Source identifier of the placeholder chunk that keeps the index non-empty.
pub const PLACEHOLDER_SOURCE: &str = "init";

/// Where a chunk came from inside its source document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOffset {
    /// Zero-based page number for paginated sources.
    pub page: Option<u32>,
    /// Position of the chunk within its page (or document).
    pub chunk_index: usize,
    /// Character offset of the chunk start within its page (or document).
    pub char_offset: usize,
}

/// A contiguous span of source text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub source_id: String,
    pub offset: ChunkOffset,
    pub content: String,
}

impl Chunk {
    pub fn new(source_id: impl Into<String>, offset: ChunkOffset, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.into(),
            offset,
            content: content.into(),
        }
    }

    /// The empty chunk inserted when an index is first created.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_SOURCE, ChunkOffset::default(), "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.source_id == PLACEHOLDER_SOURCE && self.content.is_empty()
    }
}

// =============================================================================
// Session state
// =============================================================================

/// Checkpointed state of one conversation thread.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// The most recent user input.
    pub input: String,
    pub chat_history: ChatHistory,
    /// Chunks retrieved for the most recent input.
    pub context: Vec<Chunk>,
    /// The most recent answer.
    pub answer: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// State for a fresh transition: carries history over, replaces the input.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }
}
