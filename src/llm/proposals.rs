//! Concurrent proposal extraction over a scraped reply thread.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::client::{LlmClient, LlmError};
use crate::models::{ProposalResult, ScrapeResult};

/// Extracts the entities a piece of text proposes.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Raw answer for one reply; `"None"` when nothing is proposed.
    async fn extract(&self, subject: &str, text: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl EntityExtractor for LlmClient {
    async fn extract(&self, subject: &str, text: &str) -> Result<String, LlmError> {
        self.propose(subject, text).await
    }
}

/// Ask `extractor` about every reply at once and collect the answers.
///
/// All requests run to completion; a failed request is logged and its author
/// omitted without affecting the others. Sentinel answers are dropped.
pub async fn extract_proposals<E>(
    extractor: &E,
    subject: &str,
    replies: &ScrapeResult,
) -> ProposalResult
where
    E: EntityExtractor + ?Sized,
{
    info!(
        "Extracting {} from {} replies",
        subject,
        replies.len()
    );

    let requests = replies.iter().map(|(author, body)| async move {
        let outcome = extractor.extract(subject, body).await;
        (author, outcome)
    });

    let mut failed = 0usize;
    let answers: Vec<(String, String)> = join_all(requests)
        .await
        .into_iter()
        .filter_map(|(author, outcome)| match outcome {
            Ok(answer) => {
                debug!("{} -> {:?}", author, answer);
                Some((author.clone(), answer))
            }
            Err(e) => {
                warn!("Proposal extraction failed for {}: {}", author, e);
                failed += 1;
                None
            }
        })
        .collect();

    let proposals = ProposalResult::from_answers(answers);
    info!(
        "{} replies with proposals ({} failed requests)",
        proposals.len(),
        failed
    );
    proposals
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed table keyed by reply text.
    struct TableExtractor {
        answers: HashMap<&'static str, Result<&'static str, ()>>,
        calls: AtomicUsize,
    }

    impl TableExtractor {
        fn new(answers: &[(&'static str, Result<&'static str, ()>)]) -> Self {
            Self {
                answers: answers.iter().cloned().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EntityExtractor for TableExtractor {
        async fn extract(&self, subject: &str, text: &str) -> Result<String, LlmError> {
            assert_eq!(subject, "ministers");
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            match self.answers.get(text) {
                Some(Ok(answer)) => Ok(answer.to_string()),
                Some(Err(())) => Err(LlmError::Api("HTTP 500".to_string())),
                None => Err(LlmError::Parse(format!("unexpected text {text}"))),
            }
        }
    }

    #[tokio::test]
    async fn test_sentinel_answers_are_dropped() {
        let replies: ScrapeResult = [
            ("alice".to_string(), "a".to_string()),
            ("bob".to_string(), "b".to_string()),
        ]
        .into_iter()
        .collect();
        let extractor = TableExtractor::new(&[
            ("a", Ok("Jean Dupont|Marie Curie")),
            ("b", Ok("None")),
        ]);

        let proposals = extract_proposals(&extractor, "ministers", &replies).await;

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals.get("alice"), Some("Jean Dupont|Marie Curie"));
        assert_eq!(proposals.get("bob"), None);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_cancel_siblings() {
        let replies: ScrapeResult = (1..=5)
            .map(|i| (format!("user{i}"), format!("reply {i}")))
            .collect();
        let extractor = TableExtractor::new(&[
            ("reply 1", Ok("A")),
            ("reply 2", Ok("B")),
            ("reply 3", Err(())),
            ("reply 4", Ok("D")),
            ("reply 5", Ok("E")),
        ]);

        let proposals = extract_proposals(&extractor, "ministers", &replies).await;

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 5);
        assert_eq!(proposals.len(), 4);
        assert!(proposals.get("user3").is_none());
        assert_eq!(proposals.get("user5"), Some("E"));
    }

    #[tokio::test]
    async fn test_empty_thread_makes_no_requests() {
        let extractor = TableExtractor::new(&[]);
        let proposals = extract_proposals(&extractor, "ministers", &ScrapeResult::default()).await;
        assert!(proposals.is_empty());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }
}
