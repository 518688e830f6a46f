use serde::Serialize;

use super::super::domain::ScoreVector;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub category: String,
    pub score: f64,
}

impl ScoreEntry {
    pub fn top(scores: &ScoreVector, limit: usize) -> Vec<Self> {
        scores
            .top_numeric(limit)
            .into_iter()
            .map(|(category, score)| Self {
                category: category.to_string(),
                score,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnedSuggestionView {
    pub career: String,
    pub confidence: f64,
    pub feature_overlap: usize,
    /// True when the learned label is also among the rule-based candidates.
    pub agrees_with_rules: bool,
}
