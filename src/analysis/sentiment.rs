//! Sentiment aggregation across an article set.

use crate::models::Article;

/// Aggregate per-article sentiment into one score in [-1, 1].
///
/// Positive, neutral and negative labels contribute +1, 0 and -1;
/// numeric scores are clamped into [-1, 1] before inclusion. Unknown
/// sentiments are excluded from both numerator and denominator. The
/// result is the unweighted mean of the included contributions; when
/// nothing contributes the score is 0.0, a neutral default rather than
/// an error.
pub fn aggregate(articles: &[Article]) -> f64 {
    let contributions: Vec<f64> = articles
        .iter()
        .filter_map(|a| a.sentiment.contribution())
        .collect();

    if contributions.is_empty() {
        return 0.0;
    }

    contributions.iter().sum::<f64>() / contributions.len() as f64
}

/// Display label for an aggregate score.
///
/// Thresholds match the detail view's opinion bar: above +0.33 reads
/// positive, below -0.33 negative, the band between neutral.
pub fn label(score: f64) -> &'static str {
    if score > 0.33 {
        "Positive"
    } else if score < -0.33 {
        "Negative"
    } else {
        "Neutral"
    }
}

/// Aggregate score rendered as a signed whole percentage, e.g. "-33%".
pub fn percent(score: f64) -> String {
    format!("{:.0}%", score.clamp(-1.0, 1.0) * 100.0)
}
