//! Docent application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialise tracing (RUST_LOG > --log-level > config)
//! 3. Build the embedding, generation, vector store and checkpoint backends
//! 4. Construct the conversation agent and dispatch the subcommand

mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use docent_chat::{ConversationAgent, OllamaGeneration};
use docent_core::checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use docent_core::config::{CheckpointBackend, DocentConfig, StoreBackend};
use docent_storage::SqliteCheckpointStore;
use docent_vector::{InMemoryVectorIndex, KnowledgeStore, OllamaEmbedding, OpenSearchVectorStore, VectorStore};

use cli::{CliArgs, Command};

fn load_config(path: &Path) -> Result<DocentConfig, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(DocentConfig::load(path)?)
    } else {
        Ok(DocentConfig::default())
    }
}

async fn build_agent(config: &DocentConfig) -> Result<ConversationAgent, Box<dyn std::error::Error>> {
    let embedder = OllamaEmbedding::from_config(&config.model)?;
    tracing::info!(
        model = %config.model.embedding_model,
        dimensions = config.model.embedding_dim,
        "Embedding service ready"
    );

    let backend: Arc<dyn VectorStore> = match StoreBackend::parse(&config.store.backend)? {
        StoreBackend::Memory => Arc::new(InMemoryVectorIndex::new()),
        StoreBackend::OpenSearch => Arc::new(OpenSearchVectorStore::from_config(
            &config.store,
            config.model.request_timeout_secs,
        )?),
    };
    tracing::info!(backend = %config.store.backend, index = %config.store.index_name, "Vector store selected");

    let checkpoints: Arc<dyn CheckpointStore> =
        match CheckpointBackend::parse(&config.session.checkpoint)? {
            CheckpointBackend::Memory => Arc::new(InMemoryCheckpointStore::new()),
            CheckpointBackend::Sqlite => {
                let db_path = config.data_dir().join("docent.db");
                Arc::new(SqliteCheckpointStore::open(&db_path)?)
            }
        };

    let store = Arc::new(KnowledgeStore::new(backend, embedder));
    let model = Arc::new(OllamaGeneration::from_config(&config.model)?);

    let agent = ConversationAgent::new(config, store, model, checkpoints).await?;
    tracing::info!(model = %config.model.generation_model, "Conversation agent ready");
    Ok(agent)
}

async fn ingest_all(agent: &ConversationAgent, files: &[std::path::PathBuf]) -> std::io::Result<bool> {
    let mut stdout = std::io::stdout();
    let mut all_ok = true;
    for file in files {
        all_ok &= repl::ingest_and_report(agent, file, &mut stdout).await?;
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = load_config(&config_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(args.resolve_log_level(&config.general.log_level))
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Docent v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    args.command.check_backends(
        StoreBackend::parse(&config.store.backend)?,
        CheckpointBackend::parse(&config.session.checkpoint)?,
    )?;

    let session_id = args.resolve_session(&config.general.default_session);
    let agent = build_agent(&config).await?;

    match args.command {
        Command::Ingest { files } => {
            if !ingest_all(&agent, &files).await? {
                std::process::exit(1);
            }
        }
        Command::Ask { ingest, question } => {
            ingest_all(&agent, &ingest).await?;
            let answer = agent.invoke(&session_id, &question.join(" ")).await?;
            println!("{}", answer);
        }
        Command::Chat { ingest } => {
            ingest_all(&agent, &ingest).await?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            repl::run(&agent, &session_id, stdin, &mut std::io::stdout()).await?;
        }
        Command::Sessions => {
            for id in agent.sessions().await? {
                println!("{}", id);
            }
        }
    }

    Ok(())
}
