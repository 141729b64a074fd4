use std::sync::LazyLock;

use regex::Regex;

pub const UNKNOWN: &str = "Unknown";
pub const NO_BIO: &str = "No author information available.";

static RADAR_HEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)on my radar:\s*(.+?)\s*cultural highlights").unwrap()
});
static POSSESSIVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"['’]s?$").unwrap());
static BIO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:is|was) an?\b").unwrap());

/// Name between "On my radar:" and "cultural highlights" in the headline.
pub fn attributed(heading: Option<&str>) -> String {
    heading
        .and_then(|h| RADAR_HEADLINE_RE.captures(h))
        .map(|caps| POSSESSIVE_RE.replace(caps[1].trim(), "").trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// First paragraph that reads like a biography ("X is a ...").
pub fn bio(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .find(|p| BIO_RE.is_match(p))
        .cloned()
        .unwrap_or_else(|| NO_BIO.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_from_radar_headline() {
        assert_eq!(
            attributed(Some("On my radar: Mark Kermode's cultural highlights")),
            "Mark Kermode"
        );
        assert_eq!(
            attributed(Some("On my radar: Self Esteem’s cultural highlights")),
            "Self Esteem"
        );
        assert_eq!(
            attributed(Some("on my radar: James Jones' cultural highlights")),
            "James Jones"
        );
    }

    #[test]
    fn unknown_for_other_headlines() {
        assert_eq!(attributed(Some("The best films of 2024")), UNKNOWN);
        assert_eq!(attributed(None), UNKNOWN);
    }

    #[test]
    fn bio_picks_first_copula_paragraph() {
        let paras = vec![
            "Her new film opens on Friday.".to_string(),
            "Greta Lindqvist is an actor born in Malmö.".to_string(),
            "She was a dancer first.".to_string(),
        ];
        assert_eq!(bio(&paras), "Greta Lindqvist is an actor born in Malmö.");
    }

    #[test]
    fn bio_ignores_lookalikes() {
        let paras = vec!["This avocado is amazing.".to_string()];
        assert_eq!(bio(&paras), NO_BIO);
    }
}
