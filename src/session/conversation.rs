//! Conversation engine for the detail view.
//!
//! Owns the append-only message log for one (topic, region) pair.
//! Follow-up questions become fresh retrievals against a synthesized
//! compound topic; answers are appended in completion order while the
//! asking message is appended synchronously at submission.

use crate::analysis::{aggregate, label, suggest};
use crate::config::SuggestionsConfig;
use crate::models::{AnalysisResult, Article, Message};
use crate::retrieval::{RetrievalError, Retriever};
use crate::session::controller::SessionEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Fixed reply when a follow-up fails; the real error is logged, never shown.
const APOLOGY: &str = "Sorry, I ran into a problem looking into that. Please try again.";

/// Fixed reply when a follow-up finds no articles.
const NO_RESULTS: &str = "I couldn't find anything on that. Try asking a different question.";

/// Conversation over one analysis result.
pub struct ConversationEngine {
    topic: String,
    region: String,
    sentiment: f64,
    suggested: Vec<String>,
    log: Vec<Message>,
    /// Follow-ups awaiting resolution, by id. Resolutions for ids not in
    /// here (another conversation's, or already resolved) are dropped.
    pending: HashMap<u64, String>,
    next_follow_up: u64,
    next_stamp: u64,
    retriever: Arc<dyn Retriever>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ConversationEngine {
    /// Seed a conversation from a fresh analysis result.
    pub(crate) fn new(
        topic: String,
        region: String,
        articles: &[Article],
        suggestions: &SuggestionsConfig,
        retriever: Arc<dyn Retriever>,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let sentiment = aggregate(articles);
        let suggested = suggest(articles, &region, suggestions);

        let mut engine = Self {
            topic,
            region,
            sentiment,
            suggested,
            log: Vec::new(),
            pending: HashMap::new(),
            next_follow_up: 0,
            next_stamp: 0,
            retriever,
            events_tx,
        };

        let opener = format!(
            "Coverage of {} in {} reads {} overall. I can provide more details \
             about {}'s perspective. What would you like to know?",
            engine.topic,
            engine.region,
            label(engine.sentiment).to_lowercase(),
            engine.region,
        );
        let stamp = engine.stamp();
        engine.log.push(Message::assistant(stamp, opener));

        engine
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sentiment_score(&self) -> f64 {
        self.sentiment
    }

    pub fn suggested_questions(&self) -> &[String] {
        &self.suggested
    }

    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// Stamp of the newest log entry, 0 when empty.
    pub fn last_stamp(&self) -> u64 {
        self.log.last().map(|m| m.stamp).unwrap_or(0)
    }

    /// Number of follow-ups still awaiting an answer.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    /// Submit a follow-up question.
    ///
    /// A blank question appends nothing and issues no retrieval. For a
    /// real question the asking message is appended before any network
    /// activity, then a compound topic is fetched against the same
    /// region. Returns the follow-up id, if one was issued.
    pub fn submit_question(&mut self, question: &str) -> Option<u64> {
        let question = question.trim();
        if question.is_empty() {
            debug!("ignoring blank follow-up");
            return None;
        }

        let stamp = self.stamp();
        self.log.push(Message::user(stamp, question));

        self.next_follow_up += 1;
        let id = self.next_follow_up;
        self.pending.insert(id, question.to_string());

        // The service treats follow-ups as brand-new topics, so the
        // question is rephrased to keep the original context attached.
        let compound = format!("{} regarding {} in {}", question, self.topic, self.region);
        debug!(id, topic = %compound, "follow-up issued");

        let retriever = Arc::clone(&self.retriever);
        let region = self.region.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = retriever.fetch(&compound, &region, id).await;
            let _ = tx.send(SessionEvent::FollowUpResolved { id, outcome });
        });

        Some(id)
    }

    /// Append the answer for a settled follow-up.
    ///
    /// Any failure becomes a fixed apology; the session is never
    /// interrupted and earlier messages are never touched.
    pub(crate) fn resolve(&mut self, id: u64, outcome: Result<AnalysisResult, RetrievalError>) {
        let Some(question) = self.pending.remove(&id) else {
            debug!(id, "dropping resolution for unknown follow-up");
            return;
        };

        let stamp = self.stamp();
        let message = match outcome {
            Ok(result) if !result.is_empty() => {
                let content = format!(
                    "Here's what I found on \"{}\" for {}.",
                    question, self.region
                );
                Message::assistant(stamp, content).with_articles(result)
            }
            Ok(_) => Message::assistant(stamp, NO_RESULTS),
            Err(err) if err.is_soft() => {
                debug!(id, error = %err, "follow-up found nothing");
                Message::assistant(stamp, NO_RESULTS)
            }
            Err(err) => {
                warn!(id, error = %err, "follow-up failed");
                Message::assistant(stamp, APOLOGY)
            }
        };

        self.log.push(message);
    }
}
