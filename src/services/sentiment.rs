use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::external::news_provider::NewsProvider;
use crate::external::price_provider::PriceProvider;
use crate::models::{NewsArticle, ScoredArticle, SentimentLabel, SentimentSummary};
use crate::services::reference::{self, NameCache};

/// Word valences, sorted by word for binary search. Scores roughly follow
/// the VADER convention of +-4 extremes.
const LEXICON: &[(&str, f64)] = &[
    ("bankrupt", -3.0),
    ("bearish", -1.5),
    ("beat", 1.5),
    ("bleak", -1.8),
    ("boom", 2.0),
    ("bullish", 1.5),
    ("buy", 0.7),
    ("collapse", -2.5),
    ("concern", -1.0),
    ("crash", -2.5),
    ("cut", -1.0),
    ("decline", -1.5),
    ("downgrade", -2.0),
    ("drop", -1.4),
    ("expand", 1.2),
    ("fall", -1.2),
    ("fear", -1.8),
    ("fraud", -3.0),
    ("gain", 1.5),
    ("good", 1.2),
    ("great", 2.0),
    ("growth", 1.5),
    ("jump", 1.3),
    ("lawsuit", -1.8),
    ("layoff", -2.0),
    ("loss", -1.8),
    ("miss", -1.5),
    ("optimistic", 1.5),
    ("outperform", 2.0),
    ("plunge", -2.5),
    ("profit", 1.5),
    ("rally", 2.0),
    ("rebound", 1.5),
    ("record", 1.2),
    ("recover", 1.3),
    ("risk", -0.8),
    ("slump", -2.0),
    ("soar", 2.5),
    ("strong", 1.5),
    ("surge", 2.2),
    ("tumble", -2.0),
    ("upbeat", 1.5),
    ("upgrade", 2.0),
    ("warning", -1.5),
    ("weak", -1.5),
    ("win", 1.8),
    ("worst", -2.5),
];

const NEGATORS: &[&str] = &["hardly", "neither", "never", "no", "nor", "not", "without"];

// VADER constants: negation dampening and the compound normalizer
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

fn valence(word: &str) -> Option<f64> {
    LEXICON
        .binary_search_by_key(&word, |&(w, _)| w)
        .ok()
        .map(|i| LEXICON[i].1)
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word) || word.ends_with("n't")
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Compound valence score for a text, normalized to [-1, 1] with the
/// VADER-style s / sqrt(s^2 + alpha). A negator within the two preceding
/// tokens flips and dampens a word's valence.
pub fn score_text(text: &str) -> f64 {
    let tokens = tokenize(text);
    let mut sum = 0.0;

    for (i, token) in tokens.iter().enumerate() {
        let Some(mut v) = valence(token) else {
            continue;
        };
        let negated = tokens[i.saturating_sub(2)..i].iter().any(|t| is_negator(t));
        if negated {
            v *= NEGATION_SCALAR;
        }
        sum += v;
    }

    if sum == 0.0 {
        return 0.0;
    }
    sum / (sum * sum + NORMALIZE_ALPHA).sqrt()
}

/// Positive above +0.05, negative below -0.05, neutral in between.
pub fn label(score: f64) -> SentimentLabel {
    if score > 0.05 {
        SentimentLabel::Positive
    } else if score < -0.05 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Scores each article on its description; articles without one score 0.
pub fn score_articles(articles: Vec<NewsArticle>) -> Vec<ScoredArticle> {
    articles
        .into_iter()
        .map(|article| {
            let sentiment = article
                .description
                .as_deref()
                .map(score_text)
                .unwrap_or(0.0);
            ScoredArticle {
                sentiment,
                sentiment_label: label(sentiment),
                article,
            }
        })
        .collect()
}

pub fn summarize(scored: &[ScoredArticle]) -> SentimentSummary {
    let average = if scored.is_empty() {
        0.0
    } else {
        scored.iter().map(|a| a.sentiment).sum::<f64>() / scored.len() as f64
    };

    let positive = scored
        .iter()
        .filter(|a| a.sentiment_label == SentimentLabel::Positive)
        .count();
    let negative = scored
        .iter()
        .filter(|a| a.sentiment_label == SentimentLabel::Negative)
        .count();

    SentimentSummary {
        average,
        positive,
        neutral: scored.len() - positive - negative,
        negative,
    }
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub ticker: String,
    pub company: String,
    pub days: i64,
    pub summary: SentimentSummary,
    pub articles: Vec<ScoredArticle>,
}

/// Fetches recent news for a ticker and scores it. The search query pairs
/// the symbol with the company display name, mirroring how users search.
pub async fn analyze_ticker(
    price_provider: &dyn PriceProvider,
    news_provider: &dyn NewsProvider,
    name_cache: &NameCache,
    ticker: &str,
    days: i64,
) -> Result<SentimentResponse, AppError> {
    let company = reference::company_name(name_cache, price_provider, ticker).await;
    let query = format!("{} stock OR {} stock", ticker, company);
    let from = Utc::now().date_naive() - Duration::days(days);

    let articles = news_provider.fetch_news(&query, from, 100).await?;
    info!(
        "Scoring {} articles for {} ({} day window)",
        articles.len(),
        ticker,
        days,
    );

    let mut scored = score_articles(articles);
    scored.sort_by(|a, b| b.article.published_at.cmp(&a.article.published_at));
    let summary = summarize(&scored);

    Ok(SentimentResponse {
        ticker: ticker.to_string(),
        company,
        days,
        summary,
        articles: scored,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_lexicon_is_sorted_for_binary_search() {
        for pair in LEXICON.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_positive_and_negative_texts() {
        let up = score_text("Shares surge as earnings beat expectations, strong growth ahead");
        let down = score_text("Stock plunges on fraud lawsuit, analysts fear the worst");
        assert!(up > 0.05);
        assert!(down < -0.05);
    }

    #[test]
    fn test_score_is_bounded() {
        let text = "surge surge surge surge soar soar rally rally boom outperform win";
        let score = score_text(text);
        assert!(score > 0.0 && score <= 1.0);
    }

    #[test]
    fn test_negation_flips_valence() {
        let plain = score_text("profits are strong");
        let negated = score_text("profits are not strong");
        assert!(plain > 0.0);
        assert!(negated < plain);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_unknown_words_score_zero() {
        assert_eq!(score_text("the quarterly filing was published today"), 0.0);
    }

    #[test]
    fn test_labels_use_the_five_percent_band() {
        assert_eq!(label(0.2), SentimentLabel::Positive);
        assert_eq!(label(0.05), SentimentLabel::Neutral);
        assert_eq!(label(0.0), SentimentLabel::Neutral);
        assert_eq!(label(-0.05), SentimentLabel::Neutral);
        assert_eq!(label(-0.2), SentimentLabel::Negative);
    }

    fn article(description: Option<&str>) -> NewsArticle {
        NewsArticle {
            title: "title".to_string(),
            description: description.map(|s| s.to_string()),
            url: "https://example.com".to_string(),
            source: "wire".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_missing_description_scores_zero() {
        let scored = score_articles(vec![article(None)]);
        assert_eq!(scored[0].sentiment, 0.0);
        assert_eq!(scored[0].sentiment_label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_summary_counts() {
        let scored = score_articles(vec![
            article(Some("earnings surge, strong rally")),
            article(Some("stock crash, fraud fears")),
            article(Some("nothing notable happened")),
        ]);
        let summary = summarize(&scored);
        assert_eq!(summary.positive, 1);
        assert_eq!(summary.negative, 1);
        assert_eq!(summary.neutral, 1);
    }

    #[test]
    fn test_empty_summary_averages_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.positive + summary.neutral + summary.negative, 0);
    }
}
