use std::fmt;

use thiserror::Error;

/// A single document could not be retrieved. Recovered by dropping that URL.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u128 },
    #[error("not an absolute URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, timeout_ms: u128, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// The index page could not be read. Fatal for one run.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("index page unreachable: {0}")]
    Index(#[from] FetchError),
    #[error("invalid index URL: {0}")]
    InvalidIndexUrl(#[from] url::ParseError),
}

/// The completion capability failed for one document.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("completion API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to deserialize completion response: {0}")]
    Deserialize(#[source] reqwest::Error),
    #[error("completion API returned no choices")]
    EmptyReply,
    #[error("completion timed out after {0}ms")]
    Timeout(u128),
    #[error("completion API key is missing")]
    MissingApiKey,
}

/// Labels of the line protocol spoken with the completion capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Title,
    RecommendedBy,
    RecommenderInfo,
    Snippet,
    RecommendationLink,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Title,
        Label::RecommendedBy,
        Label::RecommenderInfo,
        Label::Snippet,
        Label::RecommendationLink,
    ];

    pub const REQUIRED: [Label; 4] = [
        Label::Title,
        Label::RecommendedBy,
        Label::RecommenderInfo,
        Label::Snippet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Title => "Title",
            Label::RecommendedBy => "Recommended by",
            Label::RecommenderInfo => "Recommender info",
            Label::Snippet => "Snippet",
            Label::RecommendationLink => "Recommendation link",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The completion reply was not a usable record.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseMismatch {
    #[error("reply said no relevant information")]
    NoRelevantInformation,
    #[error("reply is missing labels: {}", join_labels(.0))]
    MissingLabels(Vec<Label>),
}

fn join_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a recommendation link was dropped. The record itself survives.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkRejection {
    #[error("link points at the origin site: {0}")]
    OriginSite(String),
    #[error("link is not an absolute URL: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("OPENAI_API_KEY must be set")]
    MissingApiKey,
}

/// The only failures a caller of `search` ever sees.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("keyword must not be empty")]
    EmptyKeyword,
    #[error("search failed, please try again ({0})")]
    Discovery(#[from] DiscoveryError),
    #[error("search failed, please try again ({0})")]
    Internal(String),
}
