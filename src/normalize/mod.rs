pub mod link;
pub mod prompt;
pub mod reply;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::error::{CompletionError, ParseMismatch};
use crate::models::{ExtractedDocument, NormalizedRecommendation};

/// Knobs for one normalization batch.
#[derive(Debug, Clone)]
pub struct NormalizeSettings {
    pub concurrency: usize,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub max_results: Option<usize>,
}

#[derive(Error, Debug)]
enum TaskError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Parse(#[from] ParseMismatch),
}

/// Run every document through prompt, completion and reply parsing under a
/// `concurrency` cap. Documents whose task fails yield nothing; the rest are
/// returned in candidate order.
///
/// Once `max_results` records are in hand, tasks still outstanding are
/// aborted.
pub async fn normalize_all(
    provider: Arc<dyn CompletionProvider>,
    documents: Vec<ExtractedDocument>,
    keyword: &str,
    origin: &Url,
    settings: &NormalizeSettings,
) -> Vec<NormalizedRecommendation> {
    let semaphore = Arc::new(Semaphore::new(settings.concurrency.max(1)));
    let total = documents.len();
    let mut tasks = JoinSet::new();

    for doc in documents {
        let provider = Arc::clone(&provider);
        let sem = Arc::clone(&semaphore);
        let keyword = keyword.to_string();
        let origin = origin.clone();
        let settings = settings.clone();

        tasks.spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let source = doc.source_link.clone();
            let position = doc.position;
            let outcome = normalize_one(provider.as_ref(), doc, &keyword, &origin, &settings).await;
            (position, source, outcome)
        });
    }

    let mut collected: Vec<(usize, NormalizedRecommendation)> = Vec::new();
    let mut rejected = 0usize;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, _, Ok(rec))) => {
                collected.push((position, rec));
                if settings.max_results.is_some_and(|cap| collected.len() >= cap) {
                    debug!("Result cap reached, aborting {} outstanding tasks", tasks.len());
                    tasks.abort_all();
                    break;
                }
            }
            Ok((_, source, Err(e))) => {
                rejected += 1;
                warn!("Normalization dropped {}: {}", source, e);
            }
            Err(e) => {
                rejected += 1;
                warn!("Normalization task failed: {}", e);
            }
        }
    }

    collected.sort_by_key(|(position, _)| *position);
    info!(
        "Normalized {} of {} documents ({} rejected)",
        collected.len(),
        total,
        rejected
    );
    collected.into_iter().map(|(_, rec)| rec).collect()
}

async fn normalize_one(
    provider: &dyn CompletionProvider,
    doc: ExtractedDocument,
    keyword: &str,
    origin: &Url,
    settings: &NormalizeSettings,
) -> Result<NormalizedRecommendation, TaskError> {
    let request = CompletionRequest {
        system: prompt::SYSTEM_PROMPT.to_string(),
        prompt: prompt::build(&doc, keyword, origin.host_str().unwrap_or_default()),
        max_tokens: settings.max_tokens,
    };

    let answer = tokio::time::timeout(settings.timeout, provider.complete(&request))
        .await
        .map_err(|_| CompletionError::Timeout(settings.timeout.as_millis()))??;

    if reply::is_no_relevant_information(&answer) {
        return Err(ParseMismatch::NoRelevantInformation.into());
    }
    let parsed = reply::parse(&answer).into_complete()?;

    let recommendation_link = match link::validate(parsed.recommendation_link.as_deref(), origin) {
        Ok(link) => link,
        Err(rejection) => {
            debug!("Dropping link for {}: {}", doc.source_link, rejection);
            None
        }
    };

    Ok(NormalizedRecommendation {
        title: parsed.title,
        snippet: parsed.snippet,
        image: doc.fields.image,
        attributed_author: parsed.recommended_by,
        author_bio: parsed.recommender_info,
        source_link: doc.source_link,
        recommendation_link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedFields;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies keyed by a marker that appears in the prompt's article link.
    #[derive(Debug, Default)]
    struct ScriptedProvider {
        replies: HashMap<String, Result<String, u16>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            let (_, scripted) = self
                .replies
                .iter()
                .find(|(marker, _)| request.prompt.contains(&format!("/{marker}\n")))
                .expect("prompt for an unscripted document");
            match scripted {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(CompletionError::Api {
                    status: *status,
                    body: "boom".to_string(),
                }),
            }
        }
    }

    /// Tracks how many completions are running at once.
    #[derive(Debug, Default)]
    struct GaugedProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for GaugedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(reply("T", "None"))
        }
    }

    fn origin() -> Url {
        Url::parse("https://www.theguardian.com").unwrap()
    }

    fn doc(position: usize, slug: &str) -> ExtractedDocument {
        ExtractedDocument {
            position,
            source_link: format!("https://www.theguardian.com/culture/{slug}"),
            fields: ExtractedFields {
                title: format!("On my radar: {slug}'s cultural highlights"),
                snippet: "A film.".to_string(),
                image: format!("https://i.guim.co.uk/{slug}.jpg"),
                attributed_author: slug.to_string(),
                author_bio: "No author information available.".to_string(),
                external_links: BTreeMap::new(),
            },
        }
    }

    fn settings(max_results: Option<usize>) -> NormalizeSettings {
        NormalizeSettings {
            concurrency: 5,
            timeout: Duration::from_secs(5),
            max_tokens: 400,
            max_results,
        }
    }

    fn reply(title: &str, link: &str) -> String {
        format!(
            "Title: {title}\nRecommended by: Ana\nRecommender info: A director.\nSnippet: One. Two. Three.\nRecommendation link: {link}"
        )
    }

    #[tokio::test]
    async fn rejects_sentinel_and_incomplete_replies() {
        let provider = ScriptedProvider {
            replies: HashMap::from([
                ("good".to_string(), Ok(reply("Aftersun", "https://mubi.com/films/aftersun"))),
                ("sentinel".to_string(), Ok("No relevant information".to_string())),
                ("partial".to_string(), Ok("Title: Something\nSnippet: Only this.".to_string())),
                ("failing".to_string(), Err(500)),
            ]),
            ..Default::default()
        };
        let docs = vec![doc(0, "good"), doc(1, "sentinel"), doc(2, "partial"), doc(3, "failing")];

        let recs =
            normalize_all(Arc::new(provider), docs, "film", &origin(), &settings(None)).await;

        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.title, "Aftersun");
        assert_eq!(r.attributed_author, "Ana");
        assert_eq!(r.author_bio, "A director.");
        assert_eq!(r.snippet, "One. Two. Three.");
        assert_eq!(r.image, "https://i.guim.co.uk/good.jpg");
        assert_eq!(r.source_link, "https://www.theguardian.com/culture/good");
        assert_eq!(r.recommendation_link.as_deref(), Some("https://mubi.com/films/aftersun"));
    }

    #[tokio::test]
    async fn origin_link_drops_only_the_link() {
        let provider = ScriptedProvider {
            replies: HashMap::from([
                ("a".to_string(), Ok(reply("A", "https://www.theguardian.com/film/a"))),
                ("b".to_string(), Ok(reply("B", "not-a-url"))),
            ]),
            ..Default::default()
        };
        let recs = normalize_all(
            Arc::new(provider),
            vec![doc(0, "a"), doc(1, "b")],
            "film",
            &origin(),
            &settings(None),
        )
        .await;

        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.recommendation_link.is_none()));
        assert_eq!(recs[0].title, "A");
        assert_eq!(recs[1].title, "B");
    }

    #[tokio::test]
    async fn slow_completion_times_out() {
        let provider = ScriptedProvider {
            replies: HashMap::from([("slow".to_string(), Ok(reply("S", "None")))]),
            delay: Some(Duration::from_millis(300)),
        };
        let mut s = settings(None);
        s.timeout = Duration::from_millis(20);

        let docs = vec![doc(0, "slow")];
        let recs = normalize_all(Arc::new(provider), docs, "film", &origin(), &s).await;
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn result_cap_is_honoured() {
        let replies = (0..6)
            .map(|i| (format!("d{i}"), Ok(reply(&format!("T{i}"), "None"))))
            .collect();
        let provider = Arc::new(ScriptedProvider {
            replies,
            ..Default::default()
        });
        let docs = (0..6).map(|i| doc(i, &format!("d{i}"))).collect();

        let recs = normalize_all(provider, docs, "film", &origin(), &settings(Some(3))).await;
        assert_eq!(recs.len(), 3);
        let positions: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[tokio::test]
    async fn in_flight_completions_never_exceed_the_cap() {
        let cap = crate::config::Config::default().normalize_concurrency;
        let provider = Arc::new(GaugedProvider::default());
        let docs = (0..cap * 2 + 2).map(|i| doc(i, &format!("d{i}"))).collect::<Vec<_>>();
        let total = docs.len();

        let mut s = settings(None);
        s.concurrency = cap;
        let recs = normalize_all(provider.clone(), docs, "film", &origin(), &s).await;

        assert_eq!(recs.len(), total);
        assert_eq!(provider.peak.load(Ordering::SeqCst), cap);
        assert_eq!(provider.in_flight.load(Ordering::SeqCst), 0);
    }
}
