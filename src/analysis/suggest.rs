//! Follow-up question derivation.
//!
//! Deterministic keyword heuristic: match configured keyword groups
//! against article text, render their templates for the selected
//! region, pad with generic fallbacks.

use crate::config::SuggestionsConfig;
use crate::models::Article;

/// Upper bound on questions offered in the detail view.
pub const MAX_SUGGESTIONS: usize = 3;

/// Derive up to [`MAX_SUGGESTIONS`] region-parameterized questions.
///
/// Rules are tested in priority order against the lowercased
/// concatenation of every headline and summary; each matched rule
/// contributes its rendered template at most once. If fewer than three
/// rules match, fallbacks are appended in their fixed order until the
/// list reaches three or the pool runs out. Identical input always
/// yields identical output.
pub fn suggest(articles: &[Article], region: &str, config: &SuggestionsConfig) -> Vec<String> {
    let mut corpus = String::new();
    for article in articles {
        corpus.push_str(&article.headline.to_lowercase());
        corpus.push(' ');
        corpus.push_str(&article.summary.to_lowercase());
        corpus.push(' ');
    }

    let mut questions: Vec<String> = Vec::new();

    for rule in &config.rules {
        if questions.len() >= MAX_SUGGESTIONS {
            break;
        }
        let matched = rule
            .keywords
            .iter()
            .any(|keyword| corpus.contains(&keyword.to_lowercase()));
        if matched {
            let rendered = render(&rule.template, region);
            if !questions.contains(&rendered) {
                questions.push(rendered);
            }
        }
    }

    for fallback in &config.fallbacks {
        if questions.len() >= MAX_SUGGESTIONS {
            break;
        }
        let rendered = render(fallback, region);
        if !questions.contains(&rendered) {
            questions.push(rendered);
        }
    }

    questions.truncate(MAX_SUGGESTIONS);
    questions
}

fn render(template: &str, region: &str) -> String {
    template.replace("{region}", region)
}
