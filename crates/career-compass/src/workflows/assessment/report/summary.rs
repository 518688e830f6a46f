use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::super::blueprint::MarketInsight;
use super::super::domain::{LayerResponses, ScoreVector};
use super::super::mapping::RankedCareer;
use super::super::repository::StoreError;
use super::super::service::Recommendation;
use super::super::storage::write_json_atomic;
use super::views::{LearnedSuggestionView, ScoreEntry};

/// Everything one assessment produced, as written to the results file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    pub consent: bool,
    pub layers: Vec<LayerResponses>,
    pub scores: ScoreVector,
    pub top_scores: Vec<ScoreEntry>,
    pub candidates: Vec<RankedCareer>,
    pub market: Vec<MarketInsight>,
    pub learned: Option<LearnedSuggestionView>,
    pub insight: Option<String>,
}

impl SessionReport {
    pub fn new(
        layers: Vec<LayerResponses>,
        scores: ScoreVector,
        recommendation: &Recommendation,
        top_n: usize,
    ) -> Self {
        let learned = recommendation
            .learned
            .as_ref()
            .map(|prediction| LearnedSuggestionView {
                career: prediction.career.clone(),
                confidence: prediction.confidence,
                feature_overlap: prediction.feature_overlap,
                agrees_with_rules: recommendation.candidates.contains(&prediction.career),
            });

        Self {
            generated_at: Utc::now(),
            consent: false,
            top_scores: ScoreEntry::top(&scores, top_n),
            layers,
            scores,
            candidates: recommendation.ranked.clone(),
            market: recommendation.market.clone(),
            learned,
            insight: None,
        }
    }

    pub fn with_consent(mut self, consent: bool) -> Self {
        self.consent = consent;
        self
    }

    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.insight = Some(insight.into());
        self
    }

    pub fn write_json(&self, path: &Path) -> Result<(), StoreError> {
        write_json_atomic(path, self)?;
        info!(path = %path.display(), "wrote session report");
        Ok(())
    }
}
