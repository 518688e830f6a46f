use std::sync::Arc;

use super::blueprint::QuestionCatalog;
use super::domain::{CategoryResponses, LayerMode, LikertAnswer, Score, ScoreVector};

/// Reduces raw per-category answers to a [`Score`] according to the category's layer mode.
#[derive(Debug, Clone)]
pub struct Scorer {
    catalog: Arc<QuestionCatalog>,
}

impl Scorer {
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn score<S: AsRef<str>>(
        &self,
        category: &str,
        answers: &[S],
    ) -> Result<Score, ScoringError> {
        let mode = self
            .catalog
            .mode_of(category)
            .ok_or_else(|| ScoringError::UnknownCategory(category.to_string()))?;
        score_answers(category, mode, answers)
    }

    /// Score every category of one collected layer, in collection order.
    pub fn score_all(&self, responses: &[CategoryResponses]) -> Result<ScoreVector, ScoringError> {
        let mut scores = ScoreVector::new();
        for response in responses {
            let score = self.score(&response.category, response.answers.as_slice())?;
            scores
                .insert(response.category.clone(), score)
                .map_err(|duplicate| ScoringError::DuplicateCategory(duplicate.0))?;
        }
        Ok(scores)
    }
}

/// Pure reduction: Likert answers become their arithmetic mean, open-ended answers pass through.
pub fn score_answers<S: AsRef<str>>(
    category: &str,
    mode: LayerMode,
    answers: &[S],
) -> Result<Score, ScoringError> {
    if answers.is_empty() {
        return Err(ScoringError::EmptyAnswers(category.to_string()));
    }

    match mode {
        LayerMode::Likert => {
            let mut total = 0u32;
            for raw in answers {
                let answer = parse_likert(category, raw.as_ref())?;
                total += u32::from(answer.value());
            }
            Ok(Score::Numeric(f64::from(total) / answers.len() as f64))
        }
        LayerMode::OpenEnded => Ok(Score::Textual(
            answers.iter().map(|raw| raw.as_ref().to_string()).collect(),
        )),
    }
}

pub fn parse_likert(category: &str, raw: &str) -> Result<LikertAnswer, ScoringError> {
    LikertAnswer::parse(raw).ok_or_else(|| ScoringError::InvalidAnswerKind {
        category: category.to_string(),
        answer: raw.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("'{answer}' is not on the answer scale for Likert category '{category}'")]
    InvalidAnswerKind { category: String, answer: String },
    #[error("category '{0}' is not part of the catalog")]
    UnknownCategory(String),
    #[error("category '{0}' received no answers")]
    EmptyAnswers(String),
    #[error("category '{0}' was answered more than once")]
    DuplicateCategory(String),
}
