//! Layered questionnaire scoring, threshold career mapping, and the optional learned ranker.

mod blueprint;
pub mod collector;
pub mod domain;
mod mapping;
pub mod ranker;
pub mod report;
pub mod repository;
mod scoring;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use blueprint::{
    AssessmentBlueprint, CareerInsight, CareerInsightTable, CareerMappingTable, CatalogError,
    CategoryPrompts, LayerDefinition, MarketInsight, QuestionCatalog,
};
pub use collector::{
    AdviceContext, Advisor, AnswerSource, CollectError, OfflineAdvisor, PromptRequest,
    ResponseCollector,
};
pub use domain::{
    CategoryResponses, DuplicateCategory, LayerMode, LayerResponses, LikertAnswer, Score,
    ScoreVector, TrainingRecord,
};
pub use mapping::{
    CandidateSupport, CareerCandidateSet, CareerMapper, RankedCareer, HIGH_SCORE_THRESHOLD,
};
pub use ranker::{LearnedRanker, ModelArtifact, Prediction, RankerError, RankerState, TrainingSummary};
pub use report::SessionReport;
pub use repository::{InMemoryCorpus, InMemoryModelStore, ModelStore, StoreError, TrainingCorpus};
pub use scoring::{score_answers, Scorer, ScoringError};
pub use service::{AssessmentError, CareerAssessmentService, Recommendation, MARKET_INSIGHT_LIMIT};
pub use storage::{FileModelStore, JsonLinesCorpus};
