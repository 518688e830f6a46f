use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scoring mode shared by every category within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerMode {
    Likert,
    OpenEnded,
}

impl LayerMode {
    pub const fn from_open_ended(open_ended: bool) -> Self {
        if open_ended {
            Self::OpenEnded
        } else {
            Self::Likert
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Likert => "Likert",
            Self::OpenEnded => "Open-ended",
        }
    }
}

/// Fixed five-point answer vocabulary for Likert prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LikertAnswer {
    Never,
    Sometimes,
    Often,
    Usually,
    Always,
}

impl LikertAnswer {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Never,
            Self::Sometimes,
            Self::Often,
            Self::Usually,
            Self::Always,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Never => "Never",
            Self::Sometimes => "Sometimes",
            Self::Often => "Often",
            Self::Usually => "Usually",
            Self::Always => "Always",
        }
    }

    pub const fn value(self) -> u8 {
        match self {
            Self::Never => 1,
            Self::Sometimes => 2,
            Self::Often => 3,
            Self::Usually => 4,
            Self::Always => 5,
        }
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|answer| answer.label().eq_ignore_ascii_case(trimmed))
    }

    /// Scale rendered for prompts, e.g. `Never, Sometimes, Often, Usually, Always`.
    pub fn scale_hint() -> String {
        Self::ordered()
            .iter()
            .map(|answer| answer.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LikertAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reduced per-category result. The variant follows the category's layer mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Numeric(f64),
    Textual(Vec<String>),
}

impl Score {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Score::Numeric(value) => Some(*value),
            Score::Textual(_) => None,
        }
    }

    pub fn mode(&self) -> LayerMode {
        match self {
            Score::Numeric(_) => LayerMode::Likert,
            Score::Textual(_) => LayerMode::OpenEnded,
        }
    }
}

/// Session-owned accumulation of category scores across processed layers.
///
/// Categories are only ever added; an attempt to score a category twice is rejected so
/// earlier layers can never be overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreVector {
    scores: BTreeMap<String, Score>,
}

impl ScoreVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        category: impl Into<String>,
        score: Score,
    ) -> Result<(), DuplicateCategory> {
        let category = category.into();
        if self.scores.contains_key(&category) {
            return Err(DuplicateCategory(category));
        }
        self.scores.insert(category, score);
        Ok(())
    }

    /// Merge another vector, rejecting it wholesale if any category already exists.
    pub fn merge(&mut self, other: ScoreVector) -> Result<(), DuplicateCategory> {
        if let Some(existing) = other.scores.keys().find(|key| self.scores.contains_key(*key)) {
            return Err(DuplicateCategory(existing.clone()));
        }
        self.scores.extend(other.scores);
        Ok(())
    }

    pub fn get(&self, category: &str) -> Option<&Score> {
        self.scores.get(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Score)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), score))
    }

    pub fn numeric(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter()
            .filter_map(|(name, score)| score.as_numeric().map(|value| (name, value)))
    }

    /// Numeric-only projection used for training records and classifier input.
    pub fn numeric_projection(&self) -> BTreeMap<String, f64> {
        self.numeric()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Highest numeric scores first; equal scores fall back to category name order.
    pub fn top_numeric(&self, limit: usize) -> Vec<(&str, f64)> {
        let mut numeric: Vec<(&str, f64)> = self.numeric().collect();
        numeric.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        numeric.truncate(limit);
        numeric
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<(String, f64)> for ScoreVector {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            scores: iter
                .into_iter()
                .map(|(name, value)| (name, Score::Numeric(value)))
                .collect(),
        }
    }
}

/// Raw answers collected for one category, in prompt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponses {
    pub category: String,
    pub answers: Vec<String>,
}

impl CategoryResponses {
    pub fn new(category: impl Into<String>, answers: Vec<String>) -> Self {
        Self {
            category: category.into(),
            answers,
        }
    }
}

/// Every category answered within one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerResponses {
    pub layer: String,
    pub categories: Vec<CategoryResponses>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("category '{0}' has already been scored in this session")]
pub struct DuplicateCategory(pub String);

/// One consented observation: numeric scores at recommendation time and the accepted career.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub features: BTreeMap<String, f64>,
    pub career: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TrainingRecord {
    pub fn from_scores(scores: &ScoreVector, career: impl Into<String>) -> Self {
        Self {
            features: scores.numeric_projection(),
            career: Some(career.into()),
            recorded_at: Utc::now(),
        }
    }

    pub fn labeled_career(&self) -> Option<&str> {
        self.career
            .as_deref()
            .map(str::trim)
            .filter(|career| !career.is_empty())
    }
}
