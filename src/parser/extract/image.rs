use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use super::meta_content;

/// Returned when no strategy finds an image.
pub const PLACEHOLDER: &str = "/static/images/placeholder.jpg";

static MAIN_REGION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main, article").unwrap());
static MAIN_MEDIA_IMG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-gu-name="media"] img, img[data-gu-contenttype="image"]"#).unwrap()
});
static JPEG_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"picture source[type="image/jpeg"]"#).unwrap());
static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static OG_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:image"], meta[name="twitter:image"]"#).unwrap()
});
static BODY_IMG: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-gu-name="body"] img, article img"#).unwrap()
});

/// Resolve the lead image: main media, then JSON-LD, then social preview,
/// then the first body image. Each candidate is made absolute before the
/// next strategy is considered. Never fails.
pub fn extract(doc: &Html, origin: &Url) -> String {
    let resolve = |raw: String| absolutize(&raw, origin);

    main_media(doc, origin)
        .or_else(|| structured_data(doc).and_then(resolve))
        .or_else(|| meta_content(doc, &OG_IMAGE).and_then(resolve))
        .or_else(|| {
            doc.select(&BODY_IMG)
                .filter_map(img_src)
                .find_map(resolve)
        })
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn main_media(doc: &Html, origin: &Url) -> Option<String> {
    let regions: Vec<ElementRef> = doc.select(&MAIN_REGION).collect();
    let regions = if regions.is_empty() {
        vec![doc.root_element()]
    } else {
        regions
    };

    regions.iter().find_map(|region| {
        region
            .select(&MAIN_MEDIA_IMG)
            .filter_map(img_src)
            .chain(
                region
                    .select(&JPEG_SOURCE)
                    .filter_map(|s| s.value().attr("srcset"))
                    .filter_map(first_srcset_url),
            )
            .find_map(|raw| absolutize(&raw, origin))
    })
}

/// `src`, then `data-src`, then the first `srcset` entry. Inline `data:`
/// placeholders used by lazy loading are skipped.
fn img_src(img: ElementRef<'_>) -> Option<String> {
    ["src", "data-src"]
        .iter()
        .filter_map(|a| img.value().attr(a))
        .map(str::trim)
        .find(|s| !s.is_empty() && !s.starts_with("data:"))
        .map(str::to_string)
        .or_else(|| img.value().attr("srcset").and_then(first_srcset_url))
}

fn first_srcset_url(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .next()
        .and_then(|entry| entry.split_whitespace().next())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

fn structured_data(doc: &Html) -> Option<String> {
    doc.select(&LD_JSON)
        .filter_map(|s| serde_json::from_str::<Value>(&s.text().collect::<String>()).ok())
        .find_map(|v| find_image(&v))
}

/// Depth-first search for an `image` field; accepts a string, an object
/// with `url`, or an array of either.
fn find_image(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map
            .get("image")
            .and_then(image_value)
            .or_else(|| map.values().find_map(find_image)),
        Value::Array(items) => items.iter().find_map(find_image),
        _ => None,
    }
}

fn image_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(image_value),
        Value::Array(items) => items.iter().find_map(image_value),
        _ => None,
    }
}

/// `//host/path` gets the default scheme; other relative paths join the origin.
pub(crate) fn absolutize(raw: &str, origin: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    match Url::parse(raw) {
        Ok(u) if u.host_str().is_some() => Some(u.to_string()),
        Ok(_) => None,
        Err(_) => origin.join(raw).ok().map(|u| u.to_string()),
    }
}
