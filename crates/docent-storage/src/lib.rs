//! Docent storage crate - SQLite persistence for session checkpoints.
//!
//! Provides a WAL-mode SQLite database with migrations and a
//! `CheckpointStore` implementation so conversations survive restarts.

pub mod checkpoint;
pub mod db;
pub mod migrations;

pub use checkpoint::SqliteCheckpointStore;
pub use db::Database;
