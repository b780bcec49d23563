//! Benchmarks for chunking and knowledge store search.
//!
//! Uses 1,000 chunks by default. Set `BENCH_FULL_SCALE=1` for 20,000:
//!
//! ```bash
//! BENCH_FULL_SCALE=1 cargo bench -p docent-vector
//! ```

use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use docent_core::types::{Chunk, ChunkOffset};
use docent_vector::embedding::MockEmbedding;
use docent_vector::index::InMemoryVectorIndex;
use docent_vector::splitter::RecursiveTextSplitter;
use docent_vector::store::KnowledgeStore;

const CI_CHUNK_COUNT: usize = 1_000;
const FULL_SCALE_CHUNK_COUNT: usize = 20_000;

fn chunk_text(index: usize) -> String {
    format!(
        "The retrieval pipeline rewrites the question using the chat history, \
         embeds the rewritten query, and pulls the nearest chunks from the \
         knowledge store. The answer is then composed from those chunks alone. \
         Chunk identifier: {}",
        index
    )
}

fn chunk_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_CHUNK_COUNT
    } else {
        CI_CHUNK_COUNT
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
}

fn build_store(rt: &tokio::runtime::Runtime, count: usize) -> KnowledgeStore {
    let store = KnowledgeStore::new(Arc::new(InMemoryVectorIndex::new()), MockEmbedding::new());
    rt.block_on(async {
        store.ensure_initialized().await.expect("init");
        let chunks: Vec<Chunk> = (0..count)
            .map(|i| {
                Chunk::new(
                    "bench.txt",
                    ChunkOffset {
                        page: None,
                        chunk_index: i,
                        char_offset: 0,
                    },
                    chunk_text(i),
                )
            })
            .collect();
        store.add(&chunks).await.expect("add");
    });
    store
}

fn bench_split(c: &mut Criterion) {
    let splitter = RecursiveTextSplitter::new(450, 0).expect("splitter");
    let text = (0..200).map(chunk_text).collect::<Vec<_>>().join("\n\n");

    c.bench_function("split_text_200_paragraphs", |b| {
        b.iter(|| splitter.split_text(&text))
    });
}

fn bench_search(c: &mut Criterion) {
    let rt = runtime();
    let count = chunk_count();
    let store = build_store(&rt, count);

    let mut group = c.benchmark_group("knowledge_store");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function(format!("search_k3_fetch5_{}", count), |b| {
        b.iter(|| {
            rt.block_on(store.search("what does the pipeline rewrite?", 3, 5))
                .expect("search")
        })
    });
    group.finish();
}

criterion_group!(benches, bench_split, bench_search);
criterion_main!(benches);
