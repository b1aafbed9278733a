//! Retrieval of news analyses from the external service.
//!
//! One call type: POST a (topic, region) pair, get back an analyzed
//! article set or a normalized failure.

pub mod client;
pub mod error;

pub use client::{AnalysisServiceClient, Retriever};
pub use error::RetrievalError;
