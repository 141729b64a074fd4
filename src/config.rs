use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_ORIGIN: &str = "https://www.theguardian.com";
const DEFAULT_INDEX_PATH: &str = "/culture/series/on-my-radar";
const DEFAULT_PATH_MARKER: &str = "on-my-radar";
const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings for the completion capability.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 400,
        }
    }
}

/// Everything a pipeline run needs, passed in at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    pub origin: Url,
    pub index_path: String,
    pub path_marker: String,
    pub fetch_concurrency: usize,
    pub normalize_concurrency: usize,
    pub fetch_timeout: Duration,
    pub completion_timeout: Duration,
    /// `None` means unlimited.
    pub max_results: Option<usize>,
    /// 0 disables the extraction cache.
    pub extraction_cache_size: usize,
    pub completion: CompletionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
            index_path: DEFAULT_INDEX_PATH.to_string(),
            path_marker: DEFAULT_PATH_MARKER.to_string(),
            fetch_concurrency: 10,
            normalize_concurrency: 5,
            fetch_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(30),
            max_results: Some(3),
            extraction_cache_size: 128,
            completion: CompletionConfig::default(),
        }
    }
}

impl Config {
    /// Build from `RADAR_*` / `OPENAI_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::default();

        if let Some(origin) = var("RADAR_ORIGIN") {
            cfg.origin = Url::parse(&origin).map_err(|_| ConfigError::Invalid {
                key: "RADAR_ORIGIN",
                value: origin.clone(),
            })?;
        }
        if let Some(path) = var("RADAR_INDEX_PATH") {
            cfg.index_path = path;
        }
        if let Some(marker) = var("RADAR_PATH_MARKER") {
            cfg.path_marker = marker;
        }
        if let Some(n) = parsed::<usize>("RADAR_FETCH_CONCURRENCY")? {
            cfg.fetch_concurrency = nonzero("RADAR_FETCH_CONCURRENCY", n)?;
        }
        if let Some(n) = parsed::<usize>("RADAR_NORMALIZE_CONCURRENCY")? {
            cfg.normalize_concurrency = nonzero("RADAR_NORMALIZE_CONCURRENCY", n)?;
        }
        if let Some(ms) = parsed::<u64>("RADAR_FETCH_TIMEOUT_MS")? {
            cfg.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64>("RADAR_COMPLETION_TIMEOUT_MS")? {
            cfg.completion_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parsed::<usize>("RADAR_MAX_RESULTS")? {
            cfg.max_results = (n > 0).then_some(n);
        }
        if let Some(n) = parsed::<usize>("RADAR_EXTRACTION_CACHE")? {
            cfg.extraction_cache_size = n;
        }

        if let Some(api_url) = var("OPENAI_API_URL") {
            cfg.completion.api_url = api_url;
        }
        cfg.completion.api_key = var("OPENAI_API_KEY");
        if let Some(model) = var("OPENAI_MODEL") {
            cfg.completion.model = model;
        }
        if let Some(n) = parsed::<u32>("OPENAI_MAX_TOKENS")? {
            cfg.completion.max_tokens = n;
        }

        Ok(cfg)
    }

    /// Absolute URL of the index page.
    pub fn index_url(&self) -> Result<Url, url::ParseError> {
        self.origin.join(&self.index_path)
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn nonzero(key: &'static str, n: usize) -> Result<usize, ConfigError> {
    if n == 0 {
        Err(ConfigError::Invalid {
            key,
            value: n.to_string(),
        })
    } else {
        Ok(n)
    }
}
