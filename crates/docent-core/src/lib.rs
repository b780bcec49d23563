pub mod checkpoint;
pub mod config;
pub mod error;
pub mod types;

pub use checkpoint::{CheckpointStore, InMemoryCheckpointStore};
pub use config::DocentConfig;
pub use error::{DocentError, Result};
pub use types::*;
