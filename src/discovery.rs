use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::config::Config;
use crate::error::DiscoveryError;
use crate::fetcher::Fetcher;
use crate::models::Candidate;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Fetch the index page and return candidate document URLs, in page order.
pub async fn discover(
    fetcher: &Fetcher,
    config: &Config,
) -> Result<Vec<Candidate>, DiscoveryError> {
    let index_url = config.index_url()?;

    info!("Fetching index page: {}", index_url);
    let html = fetcher.fetch(index_url.as_str(), config.fetch_timeout).await?;

    let candidates = candidate_urls(&html, &index_url, &config.path_marker);
    info!("Candidate documents on index: {}", candidates.len());
    Ok(candidates)
}

/// Hrefs containing `marker`, made absolute against the index URL. The index
/// itself and repeats are dropped.
pub fn candidate_urls(html: &str, index_url: &Url, marker: &str) -> Vec<Candidate> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for href in doc.select(&ANCHOR).filter_map(|a| a.value().attr("href")) {
        if !href.contains(marker) {
            continue;
        }
        let Ok(mut url) = index_url.join(href.trim()) else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        url.set_fragment(None);
        if same_page(&url, index_url) || !seen.insert(url.to_string()) {
            continue;
        }
        candidates.push(Candidate {
            position: candidates.len(),
            url: url.to_string(),
        });
    }

    candidates
}

fn same_page(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
