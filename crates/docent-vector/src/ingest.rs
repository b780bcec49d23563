//! Document loading and chunking.
//!
//! PDFs are loaded one section per page. Plain-text formats load as a single
//! section. Each section is split independently so chunk offsets stay
//! relative to their page.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use docent_core::config::IngestConfig;
use docent_core::error::DocentError;
use docent_core::types::{Chunk, ChunkOffset};

use crate::splitter::RecursiveTextSplitter;

/// File extensions loaded as plain text.
const TEXT_EXTENSIONS: [&str; 4] = ["txt", "text", "md", "markdown"];

/// One page (or the whole body) of a loaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSection {
    /// Zero-based page number; `None` for unpaginated sources.
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// File name, used as the source id of every chunk.
    pub source_id: String,
    pub path: PathBuf,
    pub sections: Vec<LoadedSection>,
}

/// Read a document from disk.
pub fn load_document(path: &Path) -> Result<LoadedDocument, DocentError> {
    if !path.is_file() {
        return Err(DocentError::Load(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }

    let source_id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let sections = if extension == "pdf" {
        load_pdf_pages(path)?
    } else if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocentError::Load(format!("{}: {}", path.display(), e)))?;
        vec![LoadedSection { page: None, text }]
    } else {
        return Err(DocentError::Load(format!(
            "Unsupported file type '{}' for {}",
            extension,
            path.display()
        )));
    };

    debug!(source = %source_id, sections = sections.len(), "Loaded document");
    Ok(LoadedDocument {
        source_id,
        path: path.to_path_buf(),
        sections,
    })
}

fn load_pdf_pages(path: &Path) -> Result<Vec<LoadedSection>, DocentError> {
    let document = lopdf::Document::load(path)
        .map_err(|e| DocentError::Load(format!("{}: {}", path.display(), e)))?;

    let mut sections = Vec::new();
    for page_number in document.get_pages().keys() {
        let text = document.extract_text(&[*page_number]).map_err(|e| {
            DocentError::Load(format!(
                "{}: page {}: {}",
                path.display(),
                page_number,
                e
            ))
        })?;
        sections.push(LoadedSection {
            page: Some(page_number.saturating_sub(1)),
            text,
        });
    }
    Ok(sections)
}

/// Loads files and cuts them into chunks ready for the knowledge store.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    splitter: RecursiveTextSplitter,
}

impl DocumentIngestor {
    pub fn new(splitter: RecursiveTextSplitter) -> Self {
        Self { splitter }
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, DocentError> {
        Ok(Self::new(RecursiveTextSplitter::from_config(config)?))
    }

    /// Load `path` and split it. Blocking; call from `spawn_blocking` in
    /// async contexts.
    pub fn ingest(&self, path: &Path) -> Result<Vec<Chunk>, DocentError> {
        let document = load_document(path)?;
        let chunks = self.split_document(&document);
        info!(
            source = %document.source_id,
            sections = document.sections.len(),
            chunks = chunks.len(),
            "Document split into chunks"
        );
        Ok(chunks)
    }

    /// Split every section of an already loaded document.
    pub fn split_document(&self, document: &LoadedDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for section in &document.sections {
            let pieces = self.splitter.split_with_offsets(&section.text);
            for (chunk_index, (char_offset, content)) in pieces.into_iter().enumerate() {
                chunks.push(Chunk::new(
                    document.source_id.clone(),
                    ChunkOffset {
                        page: section.page,
                        chunk_index,
                        char_offset,
                    },
                    content,
                ));
            }
        }
        chunks
    }
}
