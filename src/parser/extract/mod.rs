pub mod author;
pub mod image;
pub mod links;
pub mod snippet;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::ExtractedFields;

pub const UNTITLED: &str = "Untitled";

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

/// Body region first, then progressively wider containers.
const BODY_REGIONS: &[&str] = &[
    r#"[data-gu-name="body"]"#,
    ".article-body-commercial-selector",
    "#maincontent",
    "article",
    "main",
];

/// Run every field extractor over one parsed document.
pub fn extract_all(doc: &Html, origin: &Url, keyword: &str) -> ExtractedFields {
    let paragraphs = paragraphs(doc);
    let heading = heading(doc);

    ExtractedFields {
        title: title(doc, heading.as_deref()),
        snippet: snippet::extract(doc, &paragraphs, keyword),
        image: image::extract(doc, origin),
        attributed_author: author::attributed(heading.as_deref()),
        author_bio: author::bio(&paragraphs),
        external_links: links::extract(doc, origin),
    }
}

fn heading(doc: &Html) -> Option<String> {
    doc.select(&H1).map(text_of).find(|t| !t.is_empty())
}

fn title(doc: &Html, heading: Option<&str>) -> String {
    heading
        .map(str::to_string)
        .or_else(|| meta_content(doc, &OG_TITLE))
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Non-empty paragraph texts in document order.
pub(crate) fn paragraphs(doc: &Html) -> Vec<String> {
    doc.select(&PARAGRAPH)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect()
}

/// The narrowest matching article body, or the whole document.
pub(crate) fn body_region(doc: &Html) -> ElementRef<'_> {
    BODY_REGIONS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element())
}

/// Element text with whitespace runs collapsed.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    collapse(&el.text().collect::<String>())
}

pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://www.theguardian.com").unwrap()
    }

    fn fixture(name: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        Html::parse_document(&html)
    }

    #[test]
    fn radar_article_all_fields() {
        let doc = fixture("radar_article");
        let f = extract_all(&doc, &origin(), "film");

        assert_eq!(f.title, "On my radar: Greta Lindqvist's cultural highlights");
        assert_eq!(f.attributed_author, "Greta Lindqvist");
        assert_eq!(
            f.image,
            "https://i.guim.co.uk/img/media/lindqvist-main.jpg?width=700"
        );
        assert!(f.snippet.to_lowercase().contains("film"));
        assert!(f.author_bio.starts_with("Greta Lindqvist is a Swedish actor"));
        assert_eq!(
            f.external_links.get("Aftersun").map(String::as_str),
            Some("https://mubi.com/films/aftersun")
        );
        assert!(f
            .external_links
            .values()
            .all(|u| !u.contains("theguardian.com")));
    }

    #[test]
    fn empty_markup_uses_every_fallback() {
        let doc = Html::parse_document("");
        let f = extract_all(&doc, &origin(), "film");

        assert_eq!(f.title, UNTITLED);
        assert_eq!(f.snippet, snippet::NOT_FOUND);
        assert_eq!(f.image, image::PLACEHOLDER);
        assert_eq!(f.attributed_author, author::UNKNOWN);
        assert_eq!(f.author_bio, author::NO_BIO);
        assert!(f.external_links.is_empty());
    }

    #[test]
    fn title_falls_back_to_social_preview() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:title" content="Preview title"></head><body></body></html>"#,
        );
        let f = extract_all(&doc, &origin(), "film");
        assert_eq!(f.title, "Preview title");
        assert_eq!(f.attributed_author, author::UNKNOWN);
    }

    #[test]
    fn body_region_prefers_marked_body() {
        let doc = Html::parse_document(
            r#"<main><p>outer</p><div data-gu-name="body"><p>inner</p></div></main>"#,
        );
        assert_eq!(text_of(body_region(&doc)), "inner");
    }
}
