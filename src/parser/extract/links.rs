use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{body_region, collapse, text_of};

static MARKED_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"a[data-link-name="in body link"], a[data-component="auto-linked-tag"], a[data-link-name="auto-linked"]"#,
    )
    .unwrap()
});
static TEXT_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p, li").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Recommendation verbs as whole words, with their inflections.
static RECOMMENDATION_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:recommend\w*|watch(?:es|ed|ing)?|listen(?:s|ed|ing)?|read(?:s|ing)?|check(?:ed)? out|lov(?:e|es|ed|ing)|go and see|discover(?:s|ed|ing)?)\b",
    )
    .unwrap()
});

/// Display text -> URL for links leaving the origin site. Three selection
/// rules are merged in order; a later rule overwrites an earlier one on the
/// same display text.
pub fn extract(doc: &Html, origin: &Url) -> BTreeMap<String, String> {
    let region = body_region(doc);
    let mut links = BTreeMap::new();

    for (text, url) in marked(region, origin)
        .into_iter()
        .chain(near_recommendation_verbs(region, origin))
        .chain(after_colon(region, origin))
    {
        links.insert(text, url);
    }

    links
}

fn marked(region: ElementRef<'_>, origin: &Url) -> Vec<(String, String)> {
    region
        .select(&MARKED_ANCHOR)
        .filter_map(|a| external_pair(a, origin))
        .collect()
}

fn near_recommendation_verbs(region: ElementRef<'_>, origin: &Url) -> Vec<(String, String)> {
    region
        .select(&TEXT_BLOCK)
        .filter(|block| RECOMMENDATION_VERB_RE.is_match(&text_of(*block)))
        .flat_map(|block| block.select(&ANCHOR).collect::<Vec<_>>())
        .filter_map(|a| external_pair(a, origin))
        .collect()
}

/// Anchors whose preceding paragraph text ends in a colon, as in
/// "Film: <a>Aftersun</a>".
fn after_colon(region: ElementRef<'_>, origin: &Url) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for para in region.select(&PARAGRAPH) {
        let mut preceding = String::new();
        for child in para.children() {
            if let Some(text) = child.value().as_text() {
                preceding.push_str(text);
                continue;
            }
            let Some(el) = ElementRef::wrap(child) else {
                continue;
            };
            if el.value().name() == "a" && preceding.trim_end().ends_with(':') {
                pairs.extend(external_pair(el, origin));
            }
            preceding.push_str(&el.text().collect::<String>());
        }
    }

    pairs
}

fn external_pair(anchor: ElementRef<'_>, origin: &Url) -> Option<(String, String)> {
    let text = collapse(&anchor.text().collect::<String>());
    if text.is_empty() {
        return None;
    }
    let href = anchor.value().attr("href")?;
    external_url(href, origin).map(|url| (text, url))
}

/// Absolute http(s) URL on a host other than the origin's.
pub(crate) fn external_url(href: &str, origin: &Url) -> Option<String> {
    let href = href.trim();
    if href.starts_with('/') && !href.starts_with("//") {
        return None;
    }
    let absolute = match href.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => href.to_string(),
    };
    let url = Url::parse(&absolute).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    if is_origin_host(host, origin) {
        return None;
    }
    Some(url.to_string())
}

/// Same host as the origin, ignoring a leading `www.`.
pub(crate) fn is_origin_host(host: &str, origin: &Url) -> bool {
    let Some(origin_host) = origin.host_str() else {
        return false;
    };
    let bare = |h: &str| h.trim_start_matches("www.").to_ascii_lowercase();
    bare(host) == bare(origin_host)
}
