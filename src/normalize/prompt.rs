use std::fmt::Write;

use crate::error::Label;
use crate::models::ExtractedDocument;

/// Exact reply the service is told to give when nothing fits.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts cultural \
recommendations from newspaper articles and answers strictly in the requested format.";

const SYNONYMS: &[(&str, &[&str])] = &[
    ("film", &["movie", "cinema"]),
    ("movie", &["film", "cinema"]),
    ("tv", &["television", "series", "show"]),
    ("music", &["song", "album", "artist"]),
    ("book", &["novel", "literature"]),
];

pub fn synonyms(keyword: &str) -> &'static [&'static str] {
    let lower = keyword.trim().to_lowercase();
    SYNONYMS
        .iter()
        .find(|(k, _)| *k == lower)
        .map(|(_, s)| *s)
        .unwrap_or(&[])
}

/// `'film', 'movie', 'cinema'`
pub fn keyword_list(keyword: &str) -> String {
    std::iter::once(keyword.trim())
        .chain(synonyms(keyword).iter().copied())
        .map(|k| format!("'{}'", k))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Instruction for one document. `origin_host` names the site whose links
/// must not be chosen.
pub fn build(doc: &ExtractedDocument, keyword: &str, origin_host: &str) -> String {
    let keywords = keyword_list(keyword);
    let f = &doc.fields;

    let mut links = String::new();
    if f.external_links.is_empty() {
        links.push_str("(none found)\n");
    }
    for (text, url) in &f.external_links {
        let _ = writeln!(links, "- {}: {}", text, url);
    }

    format!(
        "You are reviewing an article in which a well-known person shares their cultural recommendations.
Extract the recommendation that matches {keywords} from the article below.

Article title: {title}
Article snippet: {snippet}
Article link: {source}
Image: {image}
Attributed author: {author}
Author bio: {bio}
External links found in the article:
{links}
Instructions:
1. {title_label} must be the exact name of the recommended {keywords} item, not the article headline.
2. {by_label} is the name of the person giving the recommendation; {info_label} is one sentence describing who they are.
3. {snippet_label} is a passage of at least three sentences explaining what the item is and why it is recommended.
4. {link_label} is the external link above that best matches the recommended item, or another official URL for it. Never use a link on {origin_host}. Write None if there is no suitable link.
If no relevant recommendation can be found, reply with exactly: {sentinel}

Format the response as:
{title_label}: [Recommended item]
{by_label}: [Name of the person giving the recommendation]
{info_label}: [Who the recommender is]
{snippet_label}: [Detailed explanation, three or more sentences]
{link_label}: [URL or None]
",
        title = f.title,
        snippet = f.snippet,
        source = doc.source_link,
        image = f.image,
        author = f.attributed_author,
        bio = f.author_bio,
        title_label = Label::Title,
        by_label = Label::RecommendedBy,
        info_label = Label::RecommenderInfo,
        snippet_label = Label::Snippet,
        link_label = Label::RecommendationLink,
        sentinel = NO_RELEVANT_INFORMATION,
    )
}
