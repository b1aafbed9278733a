//! Top-level session state machine.
//!
//! Transitions: Idle → TopicEntered → Loading → {Detail, Error} →
//! TopicEntered, looping. Retrievals run as spawned tasks; their
//! completions are routed back as [`SessionEvent`]s and gated by the
//! request sequence id so a stale response never mutates state.

use crate::config::SuggestionsConfig;
use crate::models::{AnalysisResult, Phase, Session};
use crate::retrieval::{RetrievalError, Retriever};
use crate::session::conversation::ConversationEngine;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Completion of a spawned retrieval, delivered to the control loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// The primary region-selection retrieval settled.
    RetrievalFinished {
        seq: u64,
        region: String,
        outcome: Result<AnalysisResult, RetrievalError>,
    },
    /// A conversation follow-up settled.
    FollowUpResolved {
        id: u64,
        outcome: Result<AnalysisResult, RetrievalError>,
    },
}

/// Owns the session and drives every state transition.
pub struct SessionController {
    session: Session,
    retriever: Arc<dyn Retriever>,
    suggestions: SuggestionsConfig,
    /// Highest sequence id issued; only its response may apply.
    latest_seq: u64,
    result: Option<AnalysisResult>,
    conversation: Option<ConversationEngine>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController {
    /// Create a controller and the receiving end of its event channel.
    ///
    /// The caller loops over the receiver and feeds events back through
    /// [`SessionController::apply`].
    pub fn new(
        retriever: Arc<dyn Retriever>,
        suggestions: SuggestionsConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            session: Session::default(),
            retriever,
            suggestions,
            latest_seq: 0,
            result: None,
            conversation: None,
            events_tx,
        };
        (controller, events_rx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn conversation(&self) -> Option<&ConversationEngine> {
        self.conversation.as_ref()
    }

    /// Set the topic. Empty input is rejected before any state change;
    /// a valid topic moves to TopicEntered from any phase and clears
    /// region, result, conversation and error.
    pub fn enter_topic(&mut self, topic: &str) {
        let trimmed = topic.trim();
        if trimmed.is_empty() {
            debug!("ignoring empty topic");
            return;
        }

        self.session.topic = trimmed.to_string();
        self.session.selected_region = None;
        self.session.phase = Phase::TopicEntered;
        self.session.error_message = None;
        self.result = None;
        self.conversation = None;
        info!(topic = %self.session.topic, "topic entered");
    }

    /// Pick a region and start a retrieval for (topic, region).
    ///
    /// Allowed from TopicEntered, and from Loading to supersede the
    /// in-flight request; the superseded response is discarded by the
    /// sequence gate when it eventually arrives, not cancelled.
    pub fn select_region(&mut self, region: &str) {
        match self.session.phase {
            Phase::TopicEntered | Phase::Loading => {}
            other => {
                debug!(phase = %other, region, "ignoring region pick");
                return;
            }
        }

        let region = region.trim().to_string();
        if region.is_empty() {
            debug!("ignoring empty region");
            return;
        }

        self.latest_seq += 1;
        let seq = self.latest_seq;
        self.session.selected_region = Some(region.clone());
        self.session.phase = Phase::Loading;
        self.session.error_message = None;

        info!(%region, seq, topic = %self.session.topic, "fetching analysis");

        let retriever = Arc::clone(&self.retriever);
        let topic = self.session.topic.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = retriever.fetch(&topic, &region, seq).await;
            // A closed receiver just means the session is shutting down.
            let _ = tx.send(SessionEvent::RetrievalFinished {
                seq,
                region,
                outcome,
            });
        });
    }

    /// Feed one completion event back into the state machine.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::RetrievalFinished {
                seq,
                region,
                outcome,
            } => self.on_retrieval_settled(seq, region, outcome),
            SessionEvent::FollowUpResolved { id, outcome } => {
                match self.conversation.as_mut() {
                    Some(conversation) => conversation.resolve(id, outcome),
                    None => debug!(id, "dropping follow-up for a closed conversation"),
                }
            }
        }
    }

    fn on_retrieval_settled(
        &mut self,
        seq: u64,
        region: String,
        outcome: Result<AnalysisResult, RetrievalError>,
    ) {
        if seq != self.latest_seq {
            debug!(seq, latest = self.latest_seq, "discarding stale response");
            return;
        }
        // The topic may have changed while the request was in flight.
        if self.session.phase != Phase::Loading {
            debug!(seq, phase = %self.session.phase, "discarding response outside loading");
            return;
        }

        match outcome {
            Ok(result) => {
                info!(seq, articles = result.articles.len(), %region, "analysis ready");
                let conversation = ConversationEngine::new(
                    self.session.topic.clone(),
                    region,
                    &result.articles,
                    &self.suggestions,
                    Arc::clone(&self.retriever),
                    self.events_tx.clone(),
                );
                self.result = Some(result);
                self.conversation = Some(conversation);
                self.session.phase = Phase::Detail;
            }
            Err(err) => {
                warn!(seq, %region, error = %err, "retrieval failed");
                self.session.error_message =
                    Some(format!("Failed to load news for {}: {}", region, err));
                self.session.phase = Phase::Error;
            }
        }
    }

    /// Forward a follow-up question to the open conversation.
    pub fn submit_question(&mut self, question: &str) {
        if self.session.phase != Phase::Detail {
            debug!(phase = %self.session.phase, "no open conversation");
            return;
        }
        if let Some(conversation) = self.conversation.as_mut() {
            conversation.submit_question(question);
        }
    }

    /// Error → TopicEntered. The user can pick a region again.
    pub fn dismiss_error(&mut self) {
        if self.session.phase != Phase::Error {
            debug!(phase = %self.session.phase, "no error to dismiss");
            return;
        }
        self.session.error_message = None;
        self.session.phase = Phase::TopicEntered;
    }

    /// Detail → TopicEntered; region, result and conversation are
    /// cleared as part of closing.
    pub fn close_detail(&mut self) {
        if self.session.phase != Phase::Detail {
            debug!(phase = %self.session.phase, "no detail to close");
            return;
        }
        self.session.phase = Phase::TopicEntered;
        self.session.selected_region = None;
        self.result = None;
        self.conversation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Sentiment};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn article(sentiment: Sentiment) -> Article {
        Article {
            headline: "Tariffs ripple through farm country".to_string(),
            summary: "Crop exporters brace for losses.".to_string(),
            source_domain: "example.com".to_string(),
            source_background: None,
            sentiment,
            url: "https://example.com/a".to_string(),
        }
    }

    /// Records calls, never completes. Lets tests inject completions
    /// through `apply` in any order they choose.
    struct StallingRetriever {
        calls: Mutex<Vec<(String, String, u64)>>,
    }

    impl StallingRetriever {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String, u64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Retriever for StallingRetriever {
        async fn fetch(
            &self,
            topic: &str,
            region: &str,
            seq: u64,
        ) -> Result<AnalysisResult, RetrievalError> {
            self.calls
                .lock()
                .unwrap()
                .push((topic.to_string(), region.to_string(), seq));
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    /// Completes immediately with a canned article set.
    struct CannedRetriever {
        articles: Vec<Article>,
    }

    #[async_trait]
    impl Retriever for CannedRetriever {
        async fn fetch(
            &self,
            _topic: &str,
            _region: &str,
            seq: u64,
        ) -> Result<AnalysisResult, RetrievalError> {
            Ok(AnalysisResult::new(seq, self.articles.clone()))
        }
    }

    fn controller_with(
        retriever: Arc<dyn Retriever>,
    ) -> (SessionController, mpsc::UnboundedReceiver<SessionEvent>) {
        SessionController::new(retriever, SuggestionsConfig::default())
    }

    fn finished(
        seq: u64,
        region: &str,
        outcome: Result<AnalysisResult, RetrievalError>,
    ) -> SessionEvent {
        SessionEvent::RetrievalFinished {
            seq,
            region: region.to_string(),
            outcome,
        }
    }

    #[tokio::test]
    async fn test_topic_then_region_issues_one_call() {
        let retriever = StallingRetriever::new();
        let (mut controller, _events) = controller_with(retriever.clone());

        controller.enter_topic("tariffs");
        assert_eq!(controller.session().phase, Phase::TopicEntered);

        controller.select_region("California");
        assert_eq!(controller.session().phase, Phase::Loading);

        // The spawned task records the call.
        tokio::task::yield_now().await;
        let calls = retriever.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "tariffs");
        assert_eq!(calls[0].1, "California");
        assert_eq!(calls[0].2, 1);
    }

    #[tokio::test]
    async fn test_empty_topic_is_silent_no_op() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("   ");
        assert_eq!(controller.session().phase, Phase::Idle);
        assert!(controller.session().error_message.is_none());
    }

    #[tokio::test]
    async fn test_region_pick_requires_topic_phase() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.select_region("California");
        assert_eq!(controller.session().phase, Phase::Idle);
        assert!(controller.session().selected_region.is_none());
    }

    #[tokio::test]
    async fn test_success_opens_detail_and_seeds_conversation() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California");

        let articles = vec![
            article(Sentiment::Positive),
            article(Sentiment::Negative),
            article(Sentiment::Neutral),
        ];
        controller.apply(finished(1, "California", Ok(AnalysisResult::new(1, articles))));

        assert_eq!(controller.session().phase, Phase::Detail);
        assert_eq!(controller.result().unwrap().articles.len(), 3);

        let conversation = controller.conversation().unwrap();
        assert_eq!(conversation.sentiment_score(), 0.0);
        // The summaries mention farms, so the agricultural question is offered.
        assert!(conversation
            .suggested_questions()
            .iter()
            .any(|q| q.contains("farmers and agriculture in California")));
    }

    #[tokio::test]
    async fn test_failure_sets_region_named_banner() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California");

        controller.apply(finished(
            1,
            "California",
            Err(RetrievalError::Service {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        ));

        assert_eq!(controller.session().phase, Phase::Error);
        assert_eq!(
            controller.session().error_message.as_deref(),
            Some("Failed to load news for California: service error 502: bad gateway")
        );

        controller.dismiss_error();
        assert_eq!(controller.session().phase, Phase::TopicEntered);
        assert!(controller.session().error_message.is_none());
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California"); // seq 1
        controller.select_region("Texas"); // seq 2, supersedes

        // Fast second response lands first and wins.
        controller.apply(finished(2, "Texas", Ok(AnalysisResult::new(2, vec![]))));
        assert_eq!(controller.session().phase, Phase::Detail);

        // Slow first response arrives later and must not apply.
        controller.apply(finished(
            1,
            "California",
            Ok(AnalysisResult::new(1, vec![article(Sentiment::Positive)])),
        ));
        assert_eq!(controller.session().phase, Phase::Detail);
        assert_eq!(controller.result().unwrap().seq, 2);
        assert!(controller.result().unwrap().articles.is_empty());
        assert_eq!(controller.conversation().unwrap().region(), "Texas");
    }

    #[tokio::test]
    async fn test_stale_failure_cannot_override_fresh_success() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California"); // seq 1
        controller.select_region("Texas"); // seq 2

        controller.apply(finished(2, "Texas", Ok(AnalysisResult::new(2, vec![]))));
        controller.apply(finished(
            1,
            "California",
            Err(RetrievalError::Analysis {
                message: "nothing".to_string(),
            }),
        ));

        assert_eq!(controller.session().phase, Phase::Detail);
        assert!(controller.session().error_message.is_none());
    }

    #[tokio::test]
    async fn test_topic_change_while_loading_discards_response() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California"); // seq 1
        controller.enter_topic("immigration"); // back to TopicEntered

        controller.apply(finished(
            1,
            "California",
            Ok(AnalysisResult::new(1, vec![article(Sentiment::Positive)])),
        ));

        assert_eq!(controller.session().phase, Phase::TopicEntered);
        assert!(controller.result().is_none());
        assert!(controller.conversation().is_none());
    }

    #[tokio::test]
    async fn test_close_detail_clears_selection() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California");
        controller.apply(finished(1, "California", Ok(AnalysisResult::new(1, vec![]))));
        assert_eq!(controller.session().phase, Phase::Detail);

        controller.close_detail();
        assert_eq!(controller.session().phase, Phase::TopicEntered);
        assert!(controller.session().selected_region.is_none());
        assert!(controller.result().is_none());
        assert!(controller.conversation().is_none());
        // The topic survives for the next region pick.
        assert_eq!(controller.session().topic, "tariffs");
    }

    #[tokio::test]
    async fn test_end_to_end_through_event_channel() {
        let retriever = Arc::new(CannedRetriever {
            articles: vec![
                article(Sentiment::Positive),
                article(Sentiment::Negative),
                article(Sentiment::Neutral),
            ],
        });
        let (mut controller, mut events) = controller_with(retriever);

        controller.enter_topic("tariffs");
        controller.select_region("California");

        let event = events.recv().await.expect("completion event");
        controller.apply(event);

        assert_eq!(controller.session().phase, Phase::Detail);
        assert_eq!(controller.result().unwrap().articles.len(), 3);
        assert_eq!(
            controller.session().selected_region.as_deref(),
            Some("California")
        );
    }

    #[tokio::test]
    async fn test_follow_up_event_after_close_is_dropped() {
        let (mut controller, _events) = controller_with(StallingRetriever::new());
        controller.enter_topic("tariffs");
        controller.select_region("California");
        controller.apply(finished(1, "California", Ok(AnalysisResult::new(1, vec![]))));
        controller.close_detail();

        // Must not panic or resurrect state.
        controller.apply(SessionEvent::FollowUpResolved {
            id: 1,
            outcome: Ok(AnalysisResult::new(1, vec![])),
        });
        assert_eq!(controller.session().phase, Phase::TopicEntered);
    }
}
