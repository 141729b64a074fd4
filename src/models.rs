use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A document address found on the index page, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub position: usize,
    pub url: String,
}

/// Fields recovered from one document's markup. Every field has a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: String,
    pub snippet: String,
    pub image: String,
    pub attributed_author: String,
    pub author_bio: String,
    /// display text -> URL
    pub external_links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub position: usize,
    pub source_link: String,
    #[serde(flatten)]
    pub fields: ExtractedFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecommendation {
    pub title: String,
    pub snippet: String,
    pub image: String,
    pub attributed_author: String,
    pub author_bio: String,
    pub source_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_link: Option<String>,
}

/// Result of one `search` call. Empty `results` is a successful answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<NormalizedRecommendation>,
    pub elapsed_seconds: f64,
}
