use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::encoder::LabelEncoder;
use super::features::FeatureColumns;
use super::model::SoftmaxClassifier;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Serialized classifier: model parameters, label encoder, and fitted feature columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_columns: Vec<String>,
    pub feature_means: Vec<f64>,
    pub feature_scales: Vec<f64>,
    pub classes: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub sample_count: usize,
    pub trained_at: DateTime<Utc>,
}

/// In-memory classifier state owned by a trained ranker.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierState {
    pub(crate) columns: FeatureColumns,
    pub(crate) encoder: LabelEncoder,
    pub(crate) model: SoftmaxClassifier,
    pub(crate) sample_count: usize,
    pub(crate) trained_at: DateTime<Utc>,
}

impl ClassifierState {
    pub fn feature_columns(&self) -> &[String] {
        self.columns.names()
    }

    pub fn classes(&self) -> &[String] {
        self.encoder.classes()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_columns: self.columns.names().to_vec(),
            feature_means: self.model.means.clone(),
            feature_scales: self.model.scales.clone(),
            classes: self.encoder.classes().to_vec(),
            weights: self.model.weights.clone(),
            biases: self.model.biases.clone(),
            sample_count: self.sample_count,
            trained_at: self.trained_at,
        }
    }
}

impl TryFrom<ModelArtifact> for ClassifierState {
    type Error = ArtifactDefect;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactDefect::UnsupportedVersion(artifact.format_version));
        }

        let width = artifact.feature_columns.len();
        if artifact.feature_means.len() != width || artifact.feature_scales.len() != width {
            return Err(ArtifactDefect::Dimensions("feature statistics"));
        }
        if artifact.weights.len() != artifact.classes.len()
            || artifact.biases.len() != artifact.classes.len()
        {
            return Err(ArtifactDefect::Dimensions("class parameters"));
        }
        if artifact.weights.iter().any(|row| row.len() != width) {
            return Err(ArtifactDefect::Dimensions("weight rows"));
        }

        let finite = artifact
            .feature_means
            .iter()
            .chain(&artifact.biases)
            .chain(artifact.weights.iter().flatten())
            .all(|value| value.is_finite())
            && artifact
                .feature_scales
                .iter()
                .all(|scale| scale.is_finite() && *scale > 0.0);
        if !finite {
            return Err(ArtifactDefect::NonFinite);
        }

        let columns = FeatureColumns::from_names(artifact.feature_columns)
            .ok_or(ArtifactDefect::DuplicateColumns)?;
        let encoder =
            LabelEncoder::from_classes(artifact.classes).ok_or(ArtifactDefect::InvalidClasses)?;

        Ok(Self {
            columns,
            encoder,
            model: SoftmaxClassifier {
                means: artifact.feature_means,
                scales: artifact.feature_scales,
                weights: artifact.weights,
                biases: artifact.biases,
            },
            sample_count: artifact.sample_count,
            trained_at: artifact.trained_at,
        })
    }
}

/// Structural problems that make a persisted artifact unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactDefect {
    #[error("unsupported artifact format version {0}")]
    UnsupportedVersion(u32),
    #[error("mismatched dimensions in {0}")]
    Dimensions(&'static str),
    #[error("artifact contains non-finite parameters")]
    NonFinite,
    #[error("artifact repeats a feature column")]
    DuplicateColumns,
    #[error("artifact classes are empty, unsorted, or repeated")]
    InvalidClasses,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_columns: vec!["A".to_string()],
            feature_means: vec![3.0],
            feature_scales: vec![2.0],
            classes: vec!["X".to_string(), "Y".to_string()],
            weights: vec![vec![1.0], vec![-1.0]],
            biases: vec![0.0, 0.0],
            sample_count: 2,
            trained_at: Utc::now(),
        }
    }

    #[test]
    fn well_formed_artifact_round_trips() {
        let original = artifact();
        let state = ClassifierState::try_from(original.clone()).expect("valid artifact");
        assert_eq!(state.to_artifact(), original);
    }

    #[test]
    fn rejects_structural_defects() {
        let mut wrong_version = artifact();
        wrong_version.format_version = 99;
        assert_eq!(
            ClassifierState::try_from(wrong_version),
            Err(ArtifactDefect::UnsupportedVersion(99))
        );

        let mut short_weights = artifact();
        short_weights.weights[1].clear();
        assert!(matches!(
            ClassifierState::try_from(short_weights),
            Err(ArtifactDefect::Dimensions(_))
        ));

        let mut nan = artifact();
        nan.biases[0] = f64::NAN;
        assert_eq!(
            ClassifierState::try_from(nan),
            Err(ArtifactDefect::NonFinite)
        );

        let mut zero_scale = artifact();
        zero_scale.feature_scales[0] = 0.0;
        assert_eq!(
            ClassifierState::try_from(zero_scale),
            Err(ArtifactDefect::NonFinite)
        );

        let mut unsorted = artifact();
        unsorted.classes.reverse();
        assert_eq!(
            ClassifierState::try_from(unsorted),
            Err(ArtifactDefect::InvalidClasses)
        );
    }
}
