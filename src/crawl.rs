use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::models::{Candidate, ExtractedDocument};
use crate::parser::Extractor;

/// Crawl stats returned alongside the documents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub total: usize,
    pub matched: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Error, Debug)]
enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("extraction task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

type TaskOutcome = (Candidate, Result<Option<ExtractedDocument>, TaskError>);

/// Fetch every candidate under a `concurrency` cap and keep the documents
/// that mention `keyword`. A failed task drops only its own candidate.
///
/// Documents arrive in completion order.
pub async fn fetch_all(
    fetcher: &Fetcher,
    extractor: Arc<Extractor>,
    candidates: Vec<Candidate>,
    keyword: &str,
    concurrency: usize,
    timeout: Duration,
) -> (Vec<ExtractedDocument>, CrawlStats) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let total = candidates.len();

    // Channel: workers send outcomes, this loop folds them
    let (tx, mut rx) = tokio::sync::mpsc::channel::<TaskOutcome>(concurrency.max(1) * 2);

    for candidate in candidates {
        let fetcher = fetcher.clone();
        let extractor = Arc::clone(&extractor);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let keyword = keyword.to_string();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let outcome = crawl_one(&fetcher, extractor, &candidate, &keyword, timeout).await;
            let _ = tx.send((candidate, outcome)).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut documents = Vec::new();
    let mut stats = CrawlStats {
        total,
        ..CrawlStats::default()
    };

    while let Some((candidate, outcome)) = rx.recv().await {
        match outcome {
            Ok(Some(doc)) => {
                stats.matched += 1;
                documents.push(doc);
            }
            Ok(None) => stats.skipped += 1,
            Err(e) => {
                stats.errors += 1;
                warn!("Task failed for {}: {}", candidate.url, e);
            }
        }
    }

    info!(
        "Crawled {} documents ({} matched, {} skipped, {} errors)",
        stats.total, stats.matched, stats.skipped, stats.errors
    );
    (documents, stats)
}

async fn crawl_one(
    fetcher: &Fetcher,
    extractor: Arc<Extractor>,
    candidate: &Candidate,
    keyword: &str,
    timeout: Duration,
) -> Result<Option<ExtractedDocument>, TaskError> {
    let markup = fetcher.fetch(&candidate.url, timeout).await?;

    // HTML parsing is CPU-bound; keep it off the I/O workers
    let kw = keyword.to_string();
    let fields =
        tokio::task::spawn_blocking(move || extractor.extract_matching(&markup, &kw)).await?;

    Ok(fields.map(|fields| ExtractedDocument {
        position: candidate.position,
        source_link: candidate.url.clone(),
        fields,
    }))
}
