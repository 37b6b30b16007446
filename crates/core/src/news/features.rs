use crate::domain::news::{ArticleFeatures, NewsArticle};
use crate::news::FeatureExtractor;

const POSITIVE: &[&str] = &[
    "surge", "rise", "rally", "beat", "record", "strong", "gain", "easing", "cut", "boost",
];
const NEGATIVE: &[&str] = &[
    "plunge", "fall", "miss", "crisis", "sanction", "war", "delay", "slump", "weak", "downgrade",
];

/// Keyword-lexicon extractor. Impact, confidence and novelty are constants until a richer model
/// replaces this.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    pub impact: i32,
    pub confidence: f64,
    pub novelty: f64,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self {
            impact: 1,
            confidence: 0.7,
            novelty: 0.8,
        }
    }
}

/// Positive minus negative lexicon hits (substring match, each word counted once), clamped to
/// -2..=2.
pub fn lexicon_sentiment(title: &str, description: &str) -> i32 {
    let text = format!("{title} {description}").to_lowercase();
    let pos = POSITIVE.iter().filter(|w| text.contains(*w)).count() as i32;
    let neg = NEGATIVE.iter().filter(|w| text.contains(*w)).count() as i32;
    (pos - neg).clamp(-2, 2)
}

impl FeatureExtractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic_lexicon"
    }

    fn extract(&self, article: &NewsArticle) -> ArticleFeatures {
        ArticleFeatures {
            sentiment: lexicon_sentiment(&article.title, article.description.as_deref().unwrap_or("")),
            impact: self.impact,
            confidence: self.confidence,
            novelty: self.novelty,
            topic: "auto".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_across_title_and_description() {
        assert_eq!(lexicon_sentiment("Oil prices surge", "OPEC output cut"), 2);
        assert_eq!(lexicon_sentiment("Gold slips", ""), 0);
        assert_eq!(lexicon_sentiment("Crude falls on weak demand", ""), -2);
        assert_eq!(lexicon_sentiment("Stocks rally", "but fears of war linger"), 0);
    }

    #[test]
    fn clamps_to_five_point_scale() {
        assert_eq!(lexicon_sentiment("record rally, strong gain, boost", ""), 2);
        assert_eq!(lexicon_sentiment("plunge slump crisis downgrade", ""), -2);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        // "Rises" contains "rise".
        assert_eq!(lexicon_sentiment("Brent RISES", ""), 1);
    }

    #[test]
    fn extractor_uses_constant_weights() {
        let a = NewsArticle {
            url: "https://example.com/a".to_string(),
            title: "Chip stocks rally".to_string(),
            description: None,
            published_at: "2026-01-27T10:00:00Z".to_string(),
        };
        let f = HeuristicExtractor::default().extract(&a);
        assert_eq!(f.sentiment, 1);
        assert_eq!(f.impact, 1);
        assert_eq!(f.confidence, 0.7);
        assert_eq!(f.novelty, 0.8);
        assert_eq!(f.topic, "auto");
    }
}
