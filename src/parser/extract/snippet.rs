use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::meta_content;

pub const NOT_FOUND: &str = "No snippet found.";
pub const BUDGET: usize = 500;
const ELLIPSIS: &str = "...";

static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:description"], meta[name="description"]"#).unwrap()
});

/// Keyword-bearing paragraphs, else the preview description, else the first
/// paragraph, else `NOT_FOUND`.
pub fn extract(doc: &Html, paragraphs: &[String], keyword: &str) -> String {
    let needle = keyword.to_lowercase();
    let matching: Vec<&str> = paragraphs
        .iter()
        .filter(|p| p.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect();

    if !matching.is_empty() {
        return truncate(&matching.join(" "));
    }

    meta_content(doc, &DESCRIPTION)
        .or_else(|| paragraphs.first().cloned())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Cut to `BUDGET` characters, the last three replaced by an ellipsis.
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= BUDGET {
        return text.to_string();
    }
    let kept: String = text.chars().take(BUDGET - ELLIPSIS.len()).collect();
    format!("{}{}", kept, ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract::paragraphs;

    #[test]
    fn joins_matching_paragraphs_case_insensitively() {
        let doc = Html::parse_document(
            "<p>My favourite FILM this year.</p><p>Nothing here.</p><p>Another film night.</p>",
        );
        let paras = paragraphs(&doc);
        assert_eq!(
            extract(&doc, &paras, "film"),
            "My favourite FILM this year. Another film night."
        );
    }

    #[test]
    fn falls_back_to_description_then_first_paragraph() {
        let doc = Html::parse_document(
            r#"<head><meta name="description" content="A preview."></head><p>First.</p>"#,
        );
        let paras = paragraphs(&doc);
        assert_eq!(extract(&doc, &paras, "opera"), "A preview.");

        let doc = Html::parse_document("<p>First.</p><p>Second.</p>");
        let paras = paragraphs(&doc);
        assert_eq!(extract(&doc, &paras, "opera"), "First.");
    }

    #[test]
    fn sentinel_when_nothing_present() {
        let doc = Html::parse_document("<div></div>");
        assert_eq!(extract(&doc, &[], "film"), NOT_FOUND);
    }

    #[test]
    fn truncation_boundary() {
        let exact = "a".repeat(BUDGET);
        assert_eq!(truncate(&exact), exact);

        let long = "b".repeat(BUDGET + 1);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), BUDGET);
        assert!(cut.ends_with("..."));
        assert_eq!(&cut[..497], "b".repeat(497));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let long = "é".repeat(600);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), BUDGET);
    }
}
