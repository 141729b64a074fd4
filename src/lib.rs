//! Finds cultural recommendations in "On my radar" style newspaper columns.
//!
//! A run discovers candidate articles on an index page, fetches them under a
//! bounded worker pool, extracts fields with fallback heuristics and asks a
//! completion service to normalize each one into a [`NormalizedRecommendation`].

pub mod completion;
pub mod config;
pub mod crawl;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod pipeline;

pub use config::Config;
pub use error::PipelineError;
pub use models::{ExtractedDocument, NormalizedRecommendation, SearchOutcome};
pub use pipeline::Pipeline;
