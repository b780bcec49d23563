//! CLI argument definitions for the Docent application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docent_core::config::{CheckpointBackend, StoreBackend};
use docent_core::error::DocentError;

/// Docent - chat with your documents through a local model.
#[derive(Parser, Debug)]
#[command(name = "docent", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Conversation session identifier.
    #[arg(short = 's', long = "session", global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Add documents to the knowledge base.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a single question.
    Ask {
        /// Documents to ingest before asking.
        #[arg(long = "ingest")]
        ingest: Vec<PathBuf>,
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Interactive question loop.
    Chat {
        /// Documents to ingest before the loop starts.
        #[arg(long = "ingest")]
        ingest: Vec<PathBuf>,
    },
    /// List sessions with saved history.
    Sessions,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DOCENT_CONFIG env var > platform default (~/.docent/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("DOCENT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level. Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the session id. Priority: --session flag > config default.
    pub fn resolve_session(&self, config_session: &str) -> String {
        self.session
            .clone()
            .unwrap_or_else(|| config_session.to_string())
    }
}

impl Command {
    /// Reject commands whose effect would vanish with the process.
    ///
    /// `ingest` needs a store that outlives this run and `sessions` needs a
    /// persistent checkpoint store. `ask` and `chat` work with either.
    pub fn check_backends(&self, store: StoreBackend, checkpoint: CheckpointBackend) -> Result<(), DocentError> {
        match self {
            Command::Ingest { .. } if store == StoreBackend::Memory => Err(DocentError::Config(
                "`ingest` with store.backend = \"memory\" would discard the chunks on exit; \
                 set store.backend = \"opensearch\" or use `ask --ingest` / `chat --ingest`"
                    .into(),
            )),
            Command::Sessions if checkpoint == CheckpointBackend::Memory => Err(DocentError::Config(
                "`sessions` with session.checkpoint = \"memory\" has nothing saved to list; \
                 set session.checkpoint = \"sqlite\""
                    .into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".docent").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".docent").join("config.toml");
    }
    PathBuf::from("config.toml")
}
