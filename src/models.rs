//! Data models for the news explorer.
//!
//! This module contains the core data structures used throughout
//! the application for representing articles, sessions, and the
//! conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentiment of a single article as reported by the analysis service.
///
/// The service emits either a string label (`"positive"`, `"negative"`,
/// `"neutral"`, anything else meaning unknown) or a raw numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// Free-form numeric score; clamped into [-1, 1] when aggregated.
    Score(f64),
    /// Missing or unparseable sentiment. Excluded from aggregation.
    #[default]
    Unknown,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Score(s) => write!(f, "{:.2}", s),
            Sentiment::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for Sentiment {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            _ => Sentiment::Unknown,
        }
    }
}

impl Sentiment {
    /// Numeric contribution for aggregation, or `None` when excluded.
    pub fn contribution(&self) -> Option<f64> {
        match self {
            Sentiment::Positive => Some(1.0),
            Sentiment::Negative => Some(-1.0),
            Sentiment::Neutral => Some(0.0),
            Sentiment::Score(s) => Some(s.clamp(-1.0, 1.0)),
            Sentiment::Unknown => None,
        }
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Sentiment::from(s.as_str()),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Sentiment::Score)
                .unwrap_or(Sentiment::Unknown),
            _ => Sentiment::Unknown,
        })
    }
}

impl Serialize for Sentiment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Sentiment::Score(s) => serializer.serialize_f64(*s),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// One analyzed article as returned by the analysis service.
///
/// Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Article headline.
    #[serde(default)]
    pub headline: String,
    /// Service-generated neutral summary.
    #[serde(default)]
    pub summary: String,
    /// Domain of the publishing outlet (e.g. "sacbee.com").
    #[serde(default)]
    pub source_domain: String,
    /// Brief background on the outlet, when the service provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_background: Option<String>,
    /// Reported sentiment.
    #[serde(default)]
    pub sentiment: Sentiment,
    /// Link to the article.
    #[serde(default)]
    pub url: String,
}

/// The ordered article set produced by one retrieval, tagged with the
/// request sequence id that produced it.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Sequence id of the request this result answers.
    pub seq: u64,
    /// Articles in service order.
    pub articles: Vec<Article>,
}

impl AnalysisResult {
    pub fn new(seq: u64, articles: Vec<Article>) -> Self {
        Self { seq, articles }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "You"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Strictly-increasing position within the owning log.
    pub stamp: u64,
    /// Wall-clock time, for display only.
    pub sent_at: DateTime<Utc>,
    /// Articles backing an assistant answer, when a follow-up found any.
    pub attached: Option<AnalysisResult>,
}

impl Message {
    pub fn user(stamp: u64, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            stamp,
            sent_at: Utc::now(),
            attached: None,
        }
    }

    pub fn assistant(stamp: u64, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            stamp,
            sent_at: Utc::now(),
            attached: None,
        }
    }

    pub fn with_articles(mut self, result: AnalysisResult) -> Self {
        self.attached = Some(result);
        self
    }
}

/// Phase of the user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No topic entered yet.
    #[default]
    Idle,
    /// Topic entered, waiting for a region pick.
    TopicEntered,
    /// Retrieval in flight for the selected region.
    Loading,
    /// Analysis displayed, conversation open.
    Detail,
    /// Primary retrieval failed; banner shown, dismissible.
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::TopicEntered => write!(f, "topic entered"),
            Phase::Loading => write!(f, "loading"),
            Phase::Detail => write!(f, "detail"),
            Phase::Error => write!(f, "error"),
        }
    }
}

/// Mutable session state. Mutated only through `SessionController`
/// transitions.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub topic: String,
    pub selected_region: Option<String>,
    pub phase: Phase,
    pub error_message: Option<String>,
}
