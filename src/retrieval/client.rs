//! HTTP client for the analysis service.
//!
//! One operation: POST `{topic, location}` to `/api/analyze-news/` and
//! decode either an article list or a soft failure object. No retries,
//! no streaming; failures surface immediately to the caller.

use crate::models::{AnalysisResult, Article};
use crate::retrieval::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// The single async call type against the analysis backend.
///
/// Implementations tag the returned result with the caller's sequence id
/// so stale responses can be recognized after the fact.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn fetch(
        &self,
        topic: &str,
        region: &str,
        seq: u64,
    ) -> Result<AnalysisResult, RetrievalError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    topic: &'a str,
    /// Carries the region name; the service calls this field "location".
    location: &'a str,
}

/// Service reply: an ordered article list on success, or a soft failure.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceReply {
    Articles(Vec<Article>),
    Failure { error_message: String },
}

/// Reqwest-backed client for the news analysis service.
pub struct AnalysisServiceClient {
    base_url: String,
    http: reqwest::Client,
}

impl AnalysisServiceClient {
    /// Create a client against `base_url`. Timeout policy lives here, in
    /// the transport; callers never enforce their own.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/analyze-news/", self.base_url)
    }
}

#[async_trait]
impl Retriever for AnalysisServiceClient {
    async fn fetch(
        &self,
        topic: &str,
        region: &str,
        seq: u64,
    ) -> Result<AnalysisResult, RetrievalError> {
        debug!(topic, region, seq, "requesting analysis");

        let response = self
            .http
            .post(self.endpoint())
            .json(&AnalyzeRequest {
                topic,
                location: region,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let reply: ServiceReply = serde_json::from_str(&body)?;

        match reply {
            ServiceReply::Articles(articles) => {
                debug!(seq, count = articles.len(), "analysis received");
                Ok(AnalysisResult::new(seq, articles))
            }
            ServiceReply::Failure { error_message } => {
                warn!(seq, %error_message, "service reported a failed analysis");
                Err(RetrievalError::Analysis {
                    message: error_message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    #[test]
    fn test_request_wire_shape() {
        let request = AnalyzeRequest {
            topic: "tariffs",
            location: "California",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topic"], "tariffs");
        assert_eq!(json["location"], "California");
    }

    #[test]
    fn test_reply_decodes_article_list() {
        let body = r#"[
            {"headline": "Tariffs hit ports", "summary": "Imports slow.",
             "source_domain": "latimes.com", "sentiment": "negative",
             "url": "https://example.com/a"},
            {"headline": "Exporters adapt", "summary": "Some relief.",
             "source_domain": "sfchronicle.com", "source_background": "Bay Area daily.",
             "sentiment": "positive", "url": "https://example.com/b"}
        ]"#;

        let reply: ServiceReply = serde_json::from_str(body).unwrap();
        match reply {
            ServiceReply::Articles(articles) => {
                assert_eq!(articles.len(), 2);
                assert_eq!(articles[0].sentiment, Sentiment::Negative);
                assert_eq!(
                    articles[1].source_background.as_deref(),
                    Some("Bay Area daily.")
                );
            }
            ServiceReply::Failure { .. } => panic!("expected articles"),
        }
    }

    #[test]
    fn test_reply_decodes_soft_failure() {
        let body = r#"{"error_message": "No search results for query."}"#;
        let reply: ServiceReply = serde_json::from_str(body).unwrap();
        match reply {
            ServiceReply::Failure { error_message } => {
                assert_eq!(error_message, "No search results for query.");
            }
            ServiceReply::Articles(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_reply_rejects_garbage() {
        assert!(serde_json::from_str::<ServiceReply>(r#"{"data": 1}"#).is_err());
        assert!(serde_json::from_str::<ServiceReply>("42").is_err());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client =
            AnalysisServiceClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/analyze-news/");
    }
}
