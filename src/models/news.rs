use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news article as returned by a news provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

/// An article plus its compound valence score in [-1, 1].
#[derive(Debug, Clone, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: NewsArticle,
    pub sentiment: f64,
    pub sentiment_label: SentimentLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentSummary {
    pub average: f64,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}
