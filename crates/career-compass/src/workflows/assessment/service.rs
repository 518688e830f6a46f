use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::blueprint::{AssessmentBlueprint, CareerInsightTable, MarketInsight, QuestionCatalog};
use super::domain::{DuplicateCategory, LayerResponses, ScoreVector, TrainingRecord};
use super::mapping::{CareerCandidateSet, CareerMapper, RankedCareer};
use super::ranker::{LearnedRanker, Prediction, RankerError, TrainingSummary};
use super::repository::{ModelStore, StoreError, TrainingCorpus};
use super::scoring::{Scorer, ScoringError};

/// How many of the strongest candidates carry market insights.
pub const MARKET_INSIGHT_LIMIT: usize = 3;

/// Rule-based candidates plus the learned suggestion when a model is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub candidates: CareerCandidateSet,
    pub ranked: Vec<RankedCareer>,
    pub learned: Option<Prediction>,
    /// Insights for the first [`MARKET_INSIGHT_LIMIT`] ranked candidates.
    pub market: Vec<MarketInsight>,
}

impl Recommendation {
    /// Strongest rule-based candidate, falling back to the learned label.
    pub fn leading_career(&self) -> Option<&str> {
        self.ranked
            .first()
            .map(|ranked| ranked.career.as_str())
            .or_else(|| self.learned.as_ref().map(|p| p.career.as_str()))
    }
}

/// Service composing the scorer, career mapper, learned ranker, and training corpus.
pub struct CareerAssessmentService<M, C> {
    catalog: Arc<QuestionCatalog>,
    scorer: Scorer,
    mapper: CareerMapper,
    insights: Arc<CareerInsightTable>,
    ranker: LearnedRanker<M>,
    corpus: Arc<C>,
}

impl<M, C> CareerAssessmentService<M, C>
where
    M: ModelStore + 'static,
    C: TrainingCorpus + 'static,
{
    pub fn new(blueprint: AssessmentBlueprint, store: Arc<M>, corpus: Arc<C>) -> Self {
        let catalog = Arc::new(blueprint.catalog);
        Self {
            scorer: Scorer::new(catalog.clone()),
            mapper: CareerMapper::new(Arc::new(blueprint.careers)),
            insights: Arc::new(blueprint.insights),
            ranker: LearnedRanker::new(store),
            catalog,
            corpus,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn insights(&self) -> &CareerInsightTable {
        &self.insights
    }

    pub fn ranker(&self) -> &LearnedRanker<M> {
        &self.ranker
    }

    /// Load any persisted model. Returns whether the ranker is now trained.
    pub fn start(&mut self) -> bool {
        self.ranker.load();
        self.ranker.is_trained()
    }

    /// Score one collected layer and merge it into the session vector.
    ///
    /// The merge is all-or-nothing: on any error `scores` is left untouched.
    pub fn score_layer(
        &self,
        responses: &LayerResponses,
        scores: &mut ScoreVector,
    ) -> Result<(), AssessmentError> {
        let layer = self
            .catalog
            .layer(&responses.layer)
            .ok_or_else(|| AssessmentError::UnknownLayer(responses.layer.clone()))?;

        if let Some(stray) = responses
            .categories
            .iter()
            .find(|response| !layer.categories.iter().any(|c| c.name == response.category))
        {
            return Err(AssessmentError::CategoryOutsideLayer {
                category: stray.category.clone(),
                layer: layer.name.clone(),
            });
        }

        let layer_scores = self.scorer.score_all(&responses.categories)?;
        scores.merge(layer_scores)?;

        info!(
            layer = %layer.name,
            categories = responses.categories.len(),
            total = scores.len(),
            "scored layer"
        );
        Ok(())
    }

    /// Ranker problems degrade to the rule-based result; they never fail the call.
    pub fn recommend(&self, scores: &ScoreVector) -> Recommendation {
        let candidates = self.mapper.map(scores);
        let ranked = candidates.ranked();
        let market = ranked
            .iter()
            .take(MARKET_INSIGHT_LIMIT)
            .map(|candidate| self.insights.describe(&candidate.career))
            .collect();

        let learned = if self.ranker.is_trained() {
            match self.ranker.predict_with_confidence(scores) {
                Ok(prediction) => Some(prediction),
                Err(err) => {
                    warn!(error = %err, "learned ranker unavailable; using rule-based careers");
                    None
                }
            }
        } else {
            None
        };

        debug!(
            candidates = candidates.len(),
            learned = learned.is_some(),
            "built recommendation"
        );
        Recommendation {
            candidates,
            ranked,
            learned,
            market,
        }
    }

    pub fn predict(&self, scores: &ScoreVector) -> Result<Prediction, AssessmentError> {
        Ok(self.ranker.predict_with_confidence(scores)?)
    }

    /// Append the accepted career to the corpus when consent was granted.
    pub fn record_outcome(
        &self,
        scores: &ScoreVector,
        career: &str,
        consent: bool,
    ) -> Result<bool, AssessmentError> {
        if !consent {
            debug!("consent withheld; outcome not recorded");
            return Ok(false);
        }
        let career = career.trim();
        if career.is_empty() {
            return Err(AssessmentError::BlankCareer);
        }

        self.corpus
            .append(TrainingRecord::from_scores(scores, career))?;
        info!(career, features = scores.numeric().count(), "recorded training outcome");
        Ok(true)
    }

    /// Retrain from the whole corpus. Failure keeps the previous model in place.
    pub fn retrain(&mut self) -> Result<TrainingSummary, AssessmentError> {
        let records = self.corpus.records()?;
        Ok(self.ranker.train(&records)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Duplicate(#[from] DuplicateCategory),
    #[error("layer '{0}' is not part of the catalog")]
    UnknownLayer(String),
    #[error("category '{category}' does not belong to layer '{layer}'")]
    CategoryOutsideLayer { category: String, layer: String },
    #[error("accepted career label must not be blank")]
    BlankCareer,
    #[error(transparent)]
    Ranker(#[from] RankerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
