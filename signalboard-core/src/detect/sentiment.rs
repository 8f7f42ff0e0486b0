//! Keyword-frequency sentiment over a batch of news articles.
//!
//! Matching is plain case-insensitive substring counting, so "up" also hits
//! "upgrade" and "loss" hits "losses". That is the scoring rule, not a bug.

use serde::{Deserialize, Serialize};

use crate::domain::Article;

pub const POSITIVE_KEYWORDS: [&str; 10] = [
    "up", "rise", "gain", "bullish", "positive", "growth", "strong", "surge", "rally", "profit",
];

pub const NEGATIVE_KEYWORDS: [&str; 10] = [
    "down", "fall", "drop", "bearish", "negative", "decline", "weak", "crash", "plunge", "loss",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Length cap of the keyword histogram.
    pub top_keywords: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self { top_keywords: 10 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    /// Most frequent keywords first; ties keep first-encountered order.
    pub keywords: Vec<KeywordCount>,
    /// Per-article classification, in input order.
    pub labels: Vec<SentimentLabel>,
}

impl SentimentResult {
    pub fn total(&self) -> usize {
        self.positive_count + self.neutral_count + self.negative_count
    }

    pub fn count(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive_count,
            SentimentLabel::Neutral => self.neutral_count,
            SentimentLabel::Negative => self.negative_count,
        }
    }

    /// Fraction of articles in `label`, `None` for an empty batch.
    pub fn share(&self, label: SentimentLabel) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.count(label) as f64 / total as f64)
    }
}

/// Running keyword histogram that remembers first-seen order.
#[derive(Debug, Default)]
struct Histogram {
    entries: Vec<(&'static str, usize)>,
}

impl Histogram {
    fn add(&mut self, keyword: &'static str, hits: usize) {
        match self.entries.iter_mut().find(|(k, _)| *k == keyword) {
            Some((_, count)) => *count += hits,
            None => self.entries.push((keyword, hits)),
        }
    }

    fn top(mut self, n: usize) -> Vec<KeywordCount> {
        // sort_by is stable: equal counts keep insertion order.
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries
            .into_iter()
            .take(n)
            .map(|(keyword, count)| KeywordCount {
                keyword: keyword.to_string(),
                count,
            })
            .collect()
    }
}

fn tally(text: &str, keywords: &[&'static str], histogram: &mut Histogram) -> usize {
    let mut score = 0;
    for &kw in keywords {
        let hits = text.matches(kw).count();
        if hits > 0 {
            score += hits;
            histogram.add(kw, hits);
        }
    }
    score
}

/// Classify each article and build the keyword histogram for the batch.
pub fn score_articles(articles: &[Article], config: &SentimentConfig) -> SentimentResult {
    let mut result = SentimentResult::default();
    let mut histogram = Histogram::default();

    for article in articles {
        let text = format!(
            "{} {}",
            article.title,
            article.summary.as_deref().unwrap_or_default()
        )
        .to_lowercase();

        let pos = tally(&text, &POSITIVE_KEYWORDS, &mut histogram);
        let neg = tally(&text, &NEGATIVE_KEYWORDS, &mut histogram);

        let label = match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => SentimentLabel::Positive,
            std::cmp::Ordering::Less => SentimentLabel::Negative,
            std::cmp::Ordering::Equal => SentimentLabel::Neutral,
        };
        match label {
            SentimentLabel::Positive => result.positive_count += 1,
            SentimentLabel::Neutral => result.neutral_count += 1,
            SentimentLabel::Negative => result.negative_count += 1,
        }
        result.labels.push(label);
    }

    result.keywords = histogram.top(config.top_keywords);
    result
}
