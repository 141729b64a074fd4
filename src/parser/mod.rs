pub mod extract;

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use scraper::Html;
use tracing::debug;
use url::Url;
use xxhash_rust::xxh3::Xxh3;

use crate::models::ExtractedFields;

/// Field extractor with a bounded, content-keyed memo.
///
/// Extraction is pure, so results are cached under a hash of the raw markup
/// and the keyword (the snippet depends on it). Parsed documents are never
/// used as keys.
pub struct Extractor {
    origin: Url,
    cache: Option<Mutex<LruCache<u128, Extraction>>>,
}

#[derive(Debug, Clone)]
struct Extraction {
    mentions_keyword: bool,
    fields: ExtractedFields,
}

impl Extractor {
    pub fn new(origin: Url, capacity: usize) -> Self {
        let cache = NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c)));
        Self { origin, cache }
    }

    /// Extract every field. Never fails; missing fields get their fallback.
    pub fn extract(&self, markup: &str, keyword: &str) -> ExtractedFields {
        self.run(markup, keyword).fields
    }

    /// Extract only when the document text mentions `keyword`.
    pub fn extract_matching(&self, markup: &str, keyword: &str) -> Option<ExtractedFields> {
        let extraction = self.run(markup, keyword);
        extraction.mentions_keyword.then_some(extraction.fields)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| c.len()))
            .unwrap_or(0)
    }

    fn run(&self, markup: &str, keyword: &str) -> Extraction {
        let key = cache_key(markup, keyword);
        if let Some(hit) = self.lookup(key) {
            return hit;
        }
        let doc = Html::parse_document(markup);
        let extraction = Extraction {
            mentions_keyword: text_contains(&doc, keyword),
            fields: extract::extract_all(&doc, &self.origin, keyword),
        };
        if let Some(mut cache) = self.cache.as_ref().and_then(|c| c.lock().ok()) {
            cache.put(key, extraction.clone());
        }
        extraction
    }

    fn lookup(&self, key: u128) -> Option<Extraction> {
        let mut cache = self.cache.as_ref()?.lock().ok()?;
        let hit = cache.get(&key).cloned();
        if hit.is_some() {
            debug!(key = format!("{key:032x}"), "Extraction cache hit");
        }
        hit
    }
}

/// Case-insensitive substring test against the full document text.
fn text_contains(doc: &Html, keyword: &str) -> bool {
    let text = doc.root_element().text().collect::<String>().to_lowercase();
    text.contains(&keyword.to_lowercase())
}

fn cache_key(markup: &str, keyword: &str) -> u128 {
    let mut hasher = Xxh3::new();
    hasher.update(keyword.to_lowercase().as_bytes());
    hasher.update(&[0]);
    hasher.update(markup.as_bytes());
    hasher.digest128()
}
