//! Optional learned career ranker.
//!
//! The ranker starts `Untrained`, becomes `Trained` after a successful [`LearnedRanker::load`]
//! or [`LearnedRanker::train`], and is replaced wholesale by every later successful train.
//! A failed train never touches the current state or the persisted artifact.

mod artifact;
mod encoder;
mod features;
mod model;

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{ScoreVector, TrainingRecord};
use super::repository::{ModelStore, StoreError};

pub use artifact::{ArtifactDefect, ClassifierState, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use encoder::LabelEncoder;
pub use features::FeatureColumns;
pub use model::{ClassifierError, SoftmaxClassifier, TrainingOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum RankerState {
    Untrained,
    Trained(ClassifierState),
}

/// Outcome of a successful fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub classes: usize,
    pub samples: usize,
    pub features: usize,
    /// Set when the corpus holds a single career, so every prediction returns it.
    pub low_confidence: bool,
    pub training_accuracy: f64,
}

/// Best label for a score vector, with its probability and how many fitted columns matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub career: String,
    pub confidence: f64,
    pub feature_overlap: usize,
}

pub struct LearnedRanker<M> {
    store: Arc<M>,
    state: RankerState,
    options: TrainingOptions,
}

impl<M> LearnedRanker<M>
where
    M: ModelStore + 'static,
{
    pub fn new(store: Arc<M>) -> Self {
        Self::with_options(store, TrainingOptions::default())
    }

    pub fn with_options(store: Arc<M>, options: TrainingOptions) -> Self {
        Self {
            store,
            state: RankerState::Untrained,
            options,
        }
    }

    pub fn state(&self) -> &RankerState {
        &self.state
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, RankerState::Trained(_))
    }

    /// Adopt the persisted artifact if one exists and passes validation.
    ///
    /// Missing, unreadable, or malformed artifacts are logged and leave the ranker as it was.
    pub fn load(&mut self) -> bool {
        let artifact = match self.store.load() {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                debug!("no persisted career model found");
                return false;
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable career model");
                return false;
            }
        };

        match ClassifierState::try_from(artifact) {
            Ok(state) => {
                info!(
                    classes = state.classes().len(),
                    features = state.feature_columns().len(),
                    samples = state.sample_count(),
                    "loaded career model"
                );
                self.state = RankerState::Trained(state);
                true
            }
            Err(defect) => {
                warn!(error = %defect, "ignoring corrupt career model");
                false
            }
        }
    }

    /// Fit a fresh classifier on every record carrying a career label, persist it, then
    /// swap it in.
    pub fn train(&mut self, records: &[TrainingRecord]) -> Result<TrainingSummary, RankerError> {
        let labeled: Vec<(&TrainingRecord, &str)> = records
            .iter()
            .filter_map(|record| record.labeled_career().map(|career| (record, career)))
            .collect();
        if labeled.is_empty() {
            warn!(records = records.len(), "no labeled training records");
            return Err(RankerError::InsufficientTrainingData { labeled: 0 });
        }

        let columns = FeatureColumns::from_records(labeled.iter().map(|(record, _)| *record));
        let encoder = LabelEncoder::fit(labeled.iter().map(|(_, career)| *career));
        let rows: Vec<Vec<f64>> = labeled
            .iter()
            .map(|(record, _)| columns.project(&record.features))
            .collect();
        let labels = labeled
            .iter()
            .map(|(_, career)| encoder.encode(career).ok_or(RankerError::InconsistentState))
            .collect::<Result<Vec<_>, _>>()?;

        let model = SoftmaxClassifier::fit(&rows, &labels, encoder.len(), self.options)?;
        let mut correct = 0usize;
        for (row, label) in rows.iter().zip(&labels) {
            if model.predict(row)?.0 == *label {
                correct += 1;
            }
        }

        let summary = TrainingSummary {
            classes: encoder.len(),
            samples: rows.len(),
            features: columns.len(),
            low_confidence: encoder.len() < 2,
            training_accuracy: correct as f64 / rows.len() as f64,
        };
        let state = ClassifierState {
            columns,
            encoder,
            model,
            sample_count: rows.len(),
            trained_at: Utc::now(),
        };

        self.store.save(&state.to_artifact())?;
        self.state = RankerState::Trained(state);

        if summary.low_confidence {
            warn!(samples = summary.samples, "career model trained on a single class");
        }
        info!(
            classes = summary.classes,
            samples = summary.samples,
            features = summary.features,
            accuracy = summary.training_accuracy,
            "trained career model"
        );
        Ok(summary)
    }

    pub fn predict(&self, scores: &ScoreVector) -> Result<String, RankerError> {
        self.predict_with_confidence(scores)
            .map(|prediction| prediction.career)
    }

    pub fn predict_with_confidence(&self, scores: &ScoreVector) -> Result<Prediction, RankerError> {
        let RankerState::Trained(state) = &self.state else {
            return Err(RankerError::ModelNotTrained);
        };

        let input = state.columns.project_scores(scores);
        let feature_overlap = state.columns.overlap(scores);
        if feature_overlap == 0 {
            debug!("score vector shares no features with the career model");
        }

        let (class_id, confidence) = state.model.predict(&input)?;
        let career = state
            .encoder
            .decode(class_id)
            .ok_or(RankerError::InconsistentState)?;

        Ok(Prediction {
            career: career.to_string(),
            confidence,
            feature_overlap,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RankerError {
    #[error("training requires at least one labeled record (found {labeled})")]
    InsufficientTrainingData { labeled: usize },
    #[error("career model has not been trained or loaded")]
    ModelNotTrained,
    #[error("career model parameters and label encoder disagree")]
    InconsistentState,
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
