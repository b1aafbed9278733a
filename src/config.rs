//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.newslens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Follow-up question suggestion rules.
    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// How many articles of each result to print in full.
    #[serde(default = "default_max_shown_articles")]
    pub max_shown_articles: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            max_shown_articles: default_max_shown_articles(),
        }
    }
}

fn default_max_shown_articles() -> usize {
    5
}

/// Analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. Timeout policy lives in the transport.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120 // the backend fans out to a search index and an LLM per article
}

/// One keyword group mapped to a region-parameterized question template.
///
/// `{region}` in the template is replaced with the selected region name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRule {
    /// Substrings matched (lowercased) against headline+summary text.
    pub keywords: Vec<String>,
    /// Question template offered when any keyword matches.
    pub template: String,
}

/// Suggestion rules, in priority order, plus the generic fallback pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsConfig {
    /// Tested in order; each contributes its template at most once.
    #[serde(default = "default_rules")]
    pub rules: Vec<SuggestionRule>,

    /// Used in order to pad the list up to three questions.
    #[serde(default = "default_fallbacks")]
    pub fallbacks: Vec<String>,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            fallbacks: default_fallbacks(),
        }
    }
}

fn rule(keywords: &[&str], template: &str) -> SuggestionRule {
    SuggestionRule {
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        template: template.to_string(),
    }
}

fn default_rules() -> Vec<SuggestionRule> {
    vec![
        rule(
            &["legal", "lawsuit", "court", "sue", "litigation"],
            "What legal challenges are being mounted in {region}?",
        ),
        rule(
            &["economy", "economic", "business", "jobs", "market"],
            "How could this affect {region}'s economy?",
        ),
        rule(
            &["farm", "agricultur", "crop"],
            "How are farmers and agriculture in {region} affected?",
        ),
        rule(
            &["governor"],
            "How has {region}'s governor responded?",
        ),
    ]
}

fn default_fallbacks() -> Vec<String> {
    vec![
        "What do local officials in {region} say about this?".to_string(),
        "How does public opinion in {region} compare nationally?".to_string(),
        "What is likely to happen next in {region}?".to_string(),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".newslens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.service_url {
            self.service.base_url = url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.suggestions.rules.len(), 4);
        assert_eq!(config.suggestions.fallbacks.len(), 3);
        // Priority order: legal first, governor last.
        assert!(config.suggestions.rules[0]
            .keywords
            .contains(&"lawsuit".to_string()));
        assert!(config.suggestions.rules[3]
            .keywords
            .contains(&"governor".to_string()));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true
max_shown_articles = 2

[service]
base_url = "http://10.0.0.5:8000"
timeout_seconds = 30

[suggestions]
fallbacks = ["What changed in {region}?"]

[[suggestions.rules]]
keywords = ["port", "shipping"]
template = "How are {region}'s ports affected?"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.max_shown_articles, 2);
        assert_eq!(config.service.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.service.timeout_seconds, 30);
        assert_eq!(config.suggestions.rules.len(), 1);
        assert_eq!(config.suggestions.rules[0].keywords[0], "port");
        assert_eq!(config.suggestions.fallbacks.len(), 1);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[[suggestions.rules]]"));
    }
}
