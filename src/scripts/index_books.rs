use crate::{
    config::Config,
    error::Result,
    ml::OpenAiEmbedder,
    services::pinecone::{PineconeClient, Vector},
};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

/// Window geometry for chunking book text before embedding.
const CHUNK_CHAR_WINDOW: usize = 1200;
const CHUNK_CHAR_OVERLAP: usize = 250;

const EMBED_BATCH_SIZE: usize = 25;

/// One already-scraped book record. Producing these (fetching pages,
/// extracting fields) happens outside this repository; the indexer only
/// consumes the result.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedBook {
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pages: Option<i64>,
}

/// Lay a record out the way retrieval expects to see it: the page count is
/// embedded in the text so downstream page-pattern scans can find it.
fn searchable_text(book: &SeedBook) -> String {
    let page_info = match book.pages {
        Some(pages) => format!("\nPages: {pages}"),
        None => "\nPages: Unknown".to_string(),
    };
    format!(
        "Title: {}{}\n\nDescription: {}",
        book.title, page_info, book.description
    )
}

/// Cut text into overlapping character windows. The final window keeps the
/// remainder even when it is shorter than a full window.
fn chunk_text(text: &str, window: usize, overlap: usize) -> Vec<String> {
    assert!(overlap < window, "overlap must be smaller than the window");

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = window - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + window).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn validate_seed(book: SeedBook) -> Option<SeedBook> {
    let title = book.title.trim();
    let description = book.description.trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    Some(SeedBook {
        source: book.source.trim().to_string(),
        title: title.to_string(),
        description: description.to_string(),
        pages: book.pages.filter(|p| *p > 0),
    })
}

/// Retry operation with exponential backoff
async fn retry_with_backoff<'a, F, T, E>(
    operation: F,
    max_retries: u32,
    base_delay_ms: u64,
) -> Result<T>
where
    F: Fn() -> futures::future::BoxFuture<'a, std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt >= max_retries {
                    return Err(anyhow::anyhow!(
                        "Operation failed after {} attempts: {}",
                        max_retries,
                        e
                    )
                    .into());
                }
                let delay = base_delay_ms * 2u64.pow(attempt - 1);
                error!("Attempt {} failed, retrying in {}ms: {}", attempt, delay, e);
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// Build the vector index from a seed file: validate and dedup the records,
/// chunk each one, embed the chunks in batches, and upsert them.
pub async fn index_books(config: &Config, seed_path: &Path) -> Result<()> {
    info!("Starting book indexing from {}", seed_path.display());

    let embedder = OpenAiEmbedder::new(config)?;
    let index = PineconeClient::new(&config.pinecone_api_key, &config.pinecone_index_host)?;

    let file = File::open(seed_path)?;
    let records: Vec<SeedBook> = serde_json::from_reader(BufReader::new(file))?;
    let total_records = records.len();

    let mut seen_sources = HashSet::new();
    let mut books = Vec::new();
    let mut skipped = 0;
    for record in records {
        match validate_seed(record) {
            Some(book) if seen_sources.insert(book.source.clone()) => books.push(book),
            _ => skipped += 1,
        }
    }

    info!(
        "Seed file: {} records, {} usable, {} skipped",
        total_records,
        books.len(),
        skipped
    );
    if books.is_empty() {
        warn!("No usable books in the seed file, nothing to index");
        return Ok(());
    }

    // Chunk every book up front so the progress bar can cover all batches.
    let mut chunks: Vec<(SeedBook, String)> = Vec::new();
    for book in &books {
        for chunk in chunk_text(&searchable_text(book), CHUNK_CHAR_WINDOW, CHUNK_CHAR_OVERLAP) {
            chunks.push((book.clone(), chunk));
        }
    }
    info!("Split {} books into {} chunks", books.len(), chunks.len());

    let total_batches = chunks.len().div_ceil(EMBED_BATCH_SIZE);
    let progress = ProgressBar::new(total_batches as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] batch {pos}/{len} {msg}")
            .progress_chars("##-"),
    );

    let mut successful_batches = 0;
    let mut failed_batches = 0;

    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|(_, chunk)| chunk.clone()).collect();

        let embeddings = match embedder.encode_batch(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                error!("Failed to embed batch: {e}");
                failed_batches += 1;
                progress.inc(1);
                continue;
            }
        };

        let vectors: Vec<Vector> = batch
            .iter()
            .zip(embeddings.rows())
            .map(|((book, chunk), embedding)| Vector {
                id: Uuid::new_v4().to_string(),
                values: embedding.to_vec(),
                metadata: Some(serde_json::json!({
                    "source": book.source,
                    "text": chunk,
                    "pages": book.pages,
                })),
            })
            .collect();

        match retry_with_backoff(|| Box::pin(index.upsert(vectors.clone())), 3, 1000).await {
            Ok(_) => successful_batches += 1,
            Err(e) => {
                error!("Failed to upsert batch after retries: {e}");
                failed_batches += 1;
            }
        }

        progress.inc(1);
        // Stay under the embedding endpoint's rate limits.
        sleep(Duration::from_millis(200)).await;
    }
    progress.finish_and_clear();

    match index.describe_index_stats().await {
        Ok(stats) => info!(
            "Index now holds {} vectors ({} dimensions)",
            stats.total_vector_count, stats.dimension
        ),
        Err(e) => warn!("Could not read index stats after upsert: {e}"),
    }

    println!(
        "{} {} books, {} chunks, {} batches ok, {} failed",
        style("Indexing complete:").green().bold(),
        books.len(),
        chunks.len(),
        successful_batches,
        failed_batches
    );

    if failed_batches > 0 {
        warn!("Some batches failed to index. Consider re-running for complete coverage.");
    }

    Ok(())
}
