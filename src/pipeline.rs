use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::completion::{CompletionProvider, OpenAiProvider};
use crate::config::Config;
use crate::crawl;
use crate::discovery;
use crate::error::{CompletionError, ConfigError, DiscoveryError, PipelineError};
use crate::fetcher::Fetcher;
use crate::models::{Candidate, NormalizedRecommendation, SearchOutcome};
use crate::normalize::{self, NormalizeSettings};
use crate::parser::Extractor;

/// Discovery → fetch → extract → normalize, as one request-scoped call.
///
/// Cheap to clone. The extraction cache is shared between clones; worker
/// pools are created per run.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
    provider: Arc<dyn CompletionProvider>,
}

impl Pipeline {
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        let extractor = Arc::new(Extractor::new(
            config.origin.clone(),
            config.extraction_cache_size,
        ));
        Self {
            config: Arc::new(config),
            fetcher: Fetcher::new(),
            extractor,
            provider,
        }
    }

    /// Pipeline backed by the OpenAI-compatible endpoint in `config`.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let provider = OpenAiProvider::new(&config.completion).map_err(|e| match e {
            CompletionError::MissingApiKey => ConfigError::MissingApiKey,
            other => ConfigError::Invalid {
                key: "OPENAI_API_URL",
                value: other.to_string(),
            },
        })?;
        Ok(Self::new(config, Arc::new(provider)))
    }

    /// Inbound operation: keyword in, recommendations and elapsed seconds out.
    /// Panics inside a run surface as `PipelineError::Internal`. Dropping the
    /// returned future aborts the run, outstanding completion calls included.
    pub async fn search(&self, keyword: &str) -> Result<SearchOutcome, PipelineError> {
        let this = self.clone();
        let keyword = keyword.to_string();
        let mut run = JoinSet::new();
        run.spawn(async move { this.run(&keyword).await });

        let (results, elapsed) = match run.join_next().await {
            Some(joined) => joined.map_err(|e| PipelineError::Internal(e.to_string()))??,
            None => return Err(PipelineError::Internal("run was not scheduled".to_string())),
        };
        Ok(SearchOutcome {
            results,
            elapsed_seconds: elapsed.as_secs_f64(),
        })
    }

    /// Run the stages in order. Empty discovery or no matching documents
    /// short-circuit before the completion service is touched.
    pub async fn run(
        &self,
        keyword: &str,
    ) -> Result<(Vec<NormalizedRecommendation>, Duration), PipelineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(PipelineError::EmptyKeyword);
        }
        let t0 = Instant::now();

        let candidates = match self.discover().await {
            Ok(c) => c,
            Err(e) => {
                error!("Discovery failed for keyword '{}': {}", keyword, e);
                return Err(e.into());
            }
        };
        if candidates.is_empty() {
            info!("No candidate documents on the index");
            return Ok((Vec::new(), t0.elapsed()));
        }

        let (documents, _) = crawl::fetch_all(
            &self.fetcher,
            Arc::clone(&self.extractor),
            candidates,
            keyword,
            self.config.fetch_concurrency,
            self.config.fetch_timeout,
        )
        .await;
        if documents.is_empty() {
            info!("No documents mention '{}'", keyword);
            return Ok((Vec::new(), t0.elapsed()));
        }

        let settings = NormalizeSettings {
            concurrency: self.config.normalize_concurrency,
            timeout: self.config.completion_timeout,
            max_tokens: self.config.completion.max_tokens,
            max_results: self.config.max_results,
        };
        let mut results = normalize::normalize_all(
            Arc::clone(&self.provider),
            documents,
            keyword,
            &self.config.origin,
            &settings,
        )
        .await;
        if let Some(cap) = self.config.max_results {
            results.truncate(cap);
        }

        let elapsed = t0.elapsed();
        info!(
            "Search for '{}' produced {} recommendations in {:.1}s",
            keyword,
            results.len(),
            elapsed.as_secs_f64()
        );
        Ok((results, elapsed))
    }

    pub async fn discover(&self) -> Result<Vec<Candidate>, DiscoveryError> {
        discovery::discover(&self.fetcher, &self.config).await
    }
}
