use crate::error::Result;
use crate::models::{ChatOutcome, Preferences};
use crate::services::completion::CompletionBackend;
use crate::services::context::format_context;
use crate::services::prompt::{build_system_instruction, build_user_instruction};
use crate::services::retrieval::Retriever;
use crate::services::validator::repair_response;
use tracing::{debug, info};

pub const NO_CONTEXT_ERROR: &str =
    "No context was retrieved from the vector index. Try rebuilding it (index-books).";

/// One request/response cycle: retrieve, format, prompt, complete, repair.
/// Exactly one index round trip and at most one completion round trip per
/// call; transport failures from either collaborator propagate as errors and
/// are fatal for that request only.
#[derive(Debug, Clone)]
pub struct ChatService<R, C> {
    retriever: R,
    completion: C,
    top_k: usize,
}

impl<R, C> ChatService<R, C>
where
    R: Retriever,
    C: CompletionBackend,
{
    pub fn new(retriever: R, completion: C, top_k: usize) -> Self {
        Self {
            retriever,
            completion,
            top_k,
        }
    }

    pub async fn get_chatbot_response(
        &self,
        question: &str,
        prefs: &Preferences,
    ) -> Result<ChatOutcome> {
        let fragments = self.retriever.retrieve(question, self.top_k).await?;
        let context = format_context(&fragments);

        if context.trim().is_empty() {
            info!("No usable context for question, skipping completion call");
            return Ok(ChatOutcome::failed(NO_CONTEXT_ERROR, ""));
        }

        let system = build_system_instruction();
        let user = build_user_instruction(question, prefs, &context);
        debug!(
            context_chars = context.len(),
            fragments = fragments.len(),
            "Prompt assembled"
        );

        let raw = self.completion.complete(&system, &user).await?;
        Ok(repair_response(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::RetrievedFragment;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubRetriever {
        fragments: Vec<RetrievedFragment>,
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievedFragment>> {
            Ok(self.fragments.clone())
        }
    }

    struct CountingCompletion {
        calls: Arc<AtomicUsize>,
        payload: String,
    }

    #[async_trait]
    impl CompletionBackend for CountingCompletion {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievedFragment>> {
            Err(ApiError::ExternalServiceError("index unreachable".into()))
        }
    }

    fn service_with(
        fragments: Vec<RetrievedFragment>,
        payload: &str,
    ) -> (ChatService<StubRetriever, CountingCompletion>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ChatService::new(
            StubRetriever { fragments },
            CountingCompletion {
                calls: calls.clone(),
                payload: payload.to_string(),
            },
            10,
        );
        (service, calls)
    }

    fn some_fragments() -> Vec<RetrievedFragment> {
        vec![
            RetrievedFragment::new("gr/hobbit", "Title: The Hobbit\nPages: 310", Some(310)),
            RetrievedFragment::new("gr/mistborn", "Title: Mistborn", None),
        ]
    }

    fn five_item_payload() -> String {
        let items: Vec<_> = (1..=5)
            .map(|i| {
                json!({
                    "title": format!("Title {i}"),
                    "author": "A. Author",
                    "genre": "Fantasy",
                    "why_it_matches": "Matches the vibe.",
                    "evidence_from_sources": "Seen in context.",
                    "estimated_pages": 250 + i
                })
            })
            .collect();
        json!({"reading_list": items, "follow_up_question": "Narrow by mood?"}).to_string()
    }

    #[tokio::test]
    async fn empty_retrieval_short_circuits_before_the_completion_call() {
        let (service, calls) = service_with(Vec::new(), "{}");

        let outcome = service
            .get_chatbot_response("anything", &Preferences::default())
            .await
            .unwrap();

        match outcome {
            ChatOutcome::Failed(err) => {
                assert_eq!(err.error, NO_CONTEXT_ERROR);
                assert_eq!(err.raw, "");
            }
            ChatOutcome::ReadingList(_) => panic!("expected failure outcome"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_fragments_also_short_circuit() {
        let blank = vec![RetrievedFragment::new("s", "   ", None)];
        let (service, calls) = service_with(blank, "{}");

        let outcome = service
            .get_chatbot_response("anything", &Preferences::default())
            .await
            .unwrap();

        assert!(matches!(outcome, ChatOutcome::Failed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_completion_payload_is_surfaced_with_the_raw_text() {
        let (service, calls) = service_with(some_fragments(), "not json");

        let outcome = service
            .get_chatbot_response("cozy fantasy", &Preferences::default())
            .await
            .unwrap();

        match outcome {
            ChatOutcome::Failed(err) => assert_eq!(err.raw, "not json"),
            ChatOutcome::ReadingList(_) => panic!("expected failure outcome"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn well_formed_payload_comes_back_in_order_with_reading_times() {
        let (service, calls) = service_with(some_fragments(), &five_item_payload());

        let outcome = service
            .get_chatbot_response("cozy fantasy", &Preferences::default())
            .await
            .unwrap();

        let list = match outcome {
            ChatOutcome::ReadingList(list) => list,
            ChatOutcome::Failed(err) => panic!("unexpected failure: {}", err.error),
        };

        assert_eq!(list.reading_list.len(), 5);
        for (i, item) in list.reading_list.iter().enumerate() {
            assert_eq!(item.title.as_deref(), Some(format!("Title {}", i + 1).as_str()));
            assert!(item.estimated_reading_time_hours.is_some());
        }
        assert_eq!(list.follow_up_question, "Narrow by mood?");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failures_propagate_as_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = ChatService::new(
            FailingRetriever,
            CountingCompletion {
                calls: calls.clone(),
                payload: String::new(),
            },
            10,
        );

        let result = service
            .get_chatbot_response("anything", &Preferences::default())
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
