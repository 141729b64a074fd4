use std::sync::LazyLock;

use regex::Regex;

use super::prompt::NO_RELEVANT_INFORMATION;
use crate::error::{Label, ParseMismatch};

/// `Label: value`, tolerating list markers and markdown bold around the label.
static LABEL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*#>]+\s+)?\**\s*(title|recommended by|recommender info|snippet|recommendation link)\s*\**\s*:\s*\**\s*(.*?)\s*$",
    )
    .unwrap()
});

/// Whatever labels the reply carried. Empty values are treated as absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplyFields {
    pub title: Option<String>,
    pub recommended_by: Option<String>,
    pub recommender_info: Option<String>,
    pub snippet: Option<String>,
    pub recommendation_link: Option<String>,
}

impl ReplyFields {
    fn get(&self, label: Label) -> Option<&String> {
        match label {
            Label::Title => self.title.as_ref(),
            Label::RecommendedBy => self.recommended_by.as_ref(),
            Label::RecommenderInfo => self.recommender_info.as_ref(),
            Label::Snippet => self.snippet.as_ref(),
            Label::RecommendationLink => self.recommendation_link.as_ref(),
        }
    }

    fn slot(&mut self, label: Label) -> &mut Option<String> {
        match label {
            Label::Title => &mut self.title,
            Label::RecommendedBy => &mut self.recommended_by,
            Label::RecommenderInfo => &mut self.recommender_info,
            Label::Snippet => &mut self.snippet,
            Label::RecommendationLink => &mut self.recommendation_link,
        }
    }
}

/// A reply with every required label present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteReply {
    pub title: String,
    pub recommended_by: String,
    pub recommender_info: String,
    pub snippet: String,
    pub recommendation_link: Option<String>,
}

/// Partial parse result plus the required labels that were not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub fields: ReplyFields,
    pub missing: Vec<Label>,
}

impl ParsedReply {
    pub fn into_complete(self) -> Result<CompleteReply, ParseMismatch> {
        if !self.missing.is_empty() {
            return Err(ParseMismatch::MissingLabels(self.missing));
        }
        let ReplyFields {
            title: Some(title),
            recommended_by: Some(recommended_by),
            recommender_info: Some(recommender_info),
            snippet: Some(snippet),
            recommendation_link,
        } = self.fields
        else {
            return Err(ParseMismatch::MissingLabels(Label::REQUIRED.to_vec()));
        };
        Ok(CompleteReply {
            title,
            recommended_by,
            recommender_info,
            snippet,
            recommendation_link,
        })
    }
}

/// True when the service answered with the "nothing found" sentinel.
pub fn is_no_relevant_information(reply: &str) -> bool {
    let normalized = reply
        .trim()
        .trim_matches(|c: char| matches!(c, '.' | '"' | '\'' | '*'));
    normalized.eq_ignore_ascii_case(NO_RELEVANT_INFORMATION)
}

/// Line-oriented parse: one `Label: value` per line; only the snippet may
/// continue onto following unlabelled lines. The first occurrence of a
/// label wins.
pub fn parse(reply: &str) -> ParsedReply {
    let mut fields = ReplyFields::default();
    let mut current: Option<Label> = None;

    for line in reply.lines() {
        if let Some(caps) = LABEL_LINE_RE.captures(line) {
            let label = label_for(&caps[1]);
            let value = clean_value(&caps[2]);
            let slot = fields.slot(label);
            if slot.is_none() {
                *slot = Some(value);
                current = Some(label);
            } else {
                current = None;
            }
            continue;
        }

        if current == Some(Label::Snippet) {
            let text = line.trim();
            if let Some(snippet) = fields.snippet.as_mut() {
                if !text.is_empty() {
                    if !snippet.is_empty() {
                        snippet.push(' ');
                    }
                    snippet.push_str(text);
                }
            }
        }
    }

    for label in Label::ALL {
        let slot = fields.slot(label);
        if slot.as_deref().is_some_and(str::is_empty) {
            *slot = None;
        }
    }

    let missing = Label::REQUIRED
        .into_iter()
        .filter(|l| fields.get(*l).is_none())
        .collect();

    ParsedReply { fields, missing }
}

fn label_for(raw: &str) -> Label {
    match raw.to_lowercase().as_str() {
        "title" => Label::Title,
        "recommended by" => Label::RecommendedBy,
        "recommender info" => Label::RecommenderInfo,
        "snippet" => Label::Snippet,
        _ => Label::RecommendationLink,
    }
}

/// Drop markdown emphasis and a single pair of template brackets.
fn clean_value(raw: &str) -> String {
    let v = raw.trim().trim_matches('*').trim();
    let v = v
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(v);
    v.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Title: Aftersun
Recommended by: Greta Lindqvist
Recommender info: Swedish actor best known for Bron.
Snippet: Aftersun is Charlotte Wells's debut feature.
It follows a father and daughter on holiday in Turkey.

Lindqvist watched it three times in a week.
Recommendation link: https://mubi.com/films/aftersun";

    #[test]
    fn parses_every_label_with_multiline_snippet() {
        let parsed = parse(WELL_FORMED);
        assert!(parsed.missing.is_empty());
        let r = parsed.into_complete().unwrap();
        assert_eq!(r.title, "Aftersun");
        assert_eq!(r.recommended_by, "Greta Lindqvist");
        assert_eq!(r.recommender_info, "Swedish actor best known for Bron.");
        assert_eq!(
            r.snippet,
            "Aftersun is Charlotte Wells's debut feature. It follows a father and daughter on holiday in Turkey. Lindqvist watched it three times in a week."
        );
        assert_eq!(r.recommendation_link.as_deref(), Some("https://mubi.com/films/aftersun"));
    }

    #[test]
    fn reports_missing_labels() {
        let parsed = parse("Title: Aftersun\nSnippet: Good film. Very good. Watch it.");
        assert_eq!(parsed.missing, vec![Label::RecommendedBy, Label::RecommenderInfo]);
        assert_eq!(parsed.fields.title.as_deref(), Some("Aftersun"));
        assert_eq!(
            parsed.into_complete().unwrap_err(),
            ParseMismatch::MissingLabels(vec![Label::RecommendedBy, Label::RecommenderInfo])
        );
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let parsed = parse("Title: \nRecommended by: A\nRecommender info: B\nSnippet: C");
        assert_eq!(parsed.missing, vec![Label::Title]);
    }

    #[test]
    fn tolerates_markdown_decoration() {
        let parsed = parse(
            "**Title:** [Aftersun]\n- **Recommended by**: Greta\n* Recommender info: Actor\nSNIPPET: Text.",
        );
        assert!(parsed.missing.is_empty(), "missing {:?}", parsed.missing);
        assert_eq!(parsed.fields.title.as_deref(), Some("Aftersun"));
        assert_eq!(parsed.fields.recommended_by.as_deref(), Some("Greta"));
        assert_eq!(parsed.fields.snippet.as_deref(), Some("Text."));
    }

    #[test]
    fn first_occurrence_wins() {
        let parsed =
            parse("Title: One\nTitle: Two\nRecommended by: A\nRecommender info: B\nSnippet: C");
        assert_eq!(parsed.fields.title.as_deref(), Some("One"));
    }

    #[test]
    fn sentinel_detection() {
        assert!(is_no_relevant_information("No relevant information"));
        assert!(is_no_relevant_information("  no relevant information. "));
        assert!(!is_no_relevant_information("Title: No relevant information"));
    }
}
