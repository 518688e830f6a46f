use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;

use crate::workflows::assessment::{
    AssessmentBlueprint, CareerAssessmentService, CareerInsightTable, CareerMappingTable,
    CategoryPrompts, CategoryResponses, CollectError, InMemoryCorpus, InMemoryModelStore,
    LayerDefinition, LayerResponses, PromptRequest, QuestionCatalog, TrainingRecord,
};

pub(super) type MemoryService = CareerAssessmentService<InMemoryModelStore, InMemoryCorpus>;

/// Two Likert layers and one open-ended layer with tiny prompt sets.
pub(super) fn blueprint() -> AssessmentBlueprint {
    let layer = |name: &str, open_ended: bool, categories: &[&str]| LayerDefinition {
        name: name.to_string(),
        open_ended,
        categories: categories
            .iter()
            .map(|category| CategoryPrompts {
                name: category.to_string(),
                prompts: vec![format!("{category} one?"), format!("{category} two?")],
            })
            .collect(),
    };
    let catalog = QuestionCatalog::new(vec![
        layer("Strengths", false, &["Words", "Numbers"]),
        layer("Drive", false, &["Autonomy"]),
        layer("Reflection", true, &["Story"]),
    ])
    .expect("valid catalog");

    let mut careers = BTreeMap::new();
    careers.insert(
        "Words".to_string(),
        vec!["Journalism".to_string(), "Teaching".to_string()],
    );
    careers.insert(
        "Numbers".to_string(),
        vec!["Finance".to_string(), "Teaching".to_string()],
    );
    careers.insert("Autonomy".to_string(), vec!["Entrepreneurship".to_string()]);

    AssessmentBlueprint {
        catalog,
        careers: CareerMappingTable::new(careers),
        insights: CareerInsightTable::standard(),
    }
}

pub(super) fn service() -> (MemoryService, Arc<InMemoryModelStore>, Arc<InMemoryCorpus>) {
    let store = Arc::new(InMemoryModelStore::default());
    let corpus = Arc::new(InMemoryCorpus::default());
    let service = CareerAssessmentService::new(blueprint(), store.clone(), corpus.clone());
    (service, store, corpus)
}

pub(super) fn layer(name: &str) -> LayerBuilder {
    LayerBuilder(LayerResponses {
        layer: name.to_string(),
        categories: Vec::new(),
    })
}

pub(super) struct LayerBuilder(LayerResponses);

impl LayerBuilder {
    pub(super) fn answers(mut self, category: &str, answers: &[&str]) -> Self {
        self.0.categories.push(CategoryResponses::new(
            category,
            answers.iter().map(|answer| answer.to_string()).collect(),
        ));
        self
    }

    pub(super) fn build(self) -> LayerResponses {
        self.0
    }
}

pub(super) fn labeled(features: &[(&str, f64)], career: &str) -> TrainingRecord {
    TrainingRecord {
        features: features
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect(),
        career: Some(career.to_string()),
        recorded_at: Utc::now(),
    }
}

/// Answer source replaying a fixed script, recording everything shown to it.
#[derive(Default)]
pub(super) struct ScriptedAnswers {
    answers: VecDeque<String>,
    pub(super) shown: Vec<String>,
    pub(super) prompts: Vec<String>,
}

impl ScriptedAnswers {
    pub(super) fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl crate::workflows::assessment::AnswerSource for ScriptedAnswers {
    fn ask(&mut self, request: &PromptRequest<'_>) -> Result<String, CollectError> {
        self.prompts.push(request.prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| CollectError::Exhausted {
                category: request.category.to_string(),
            })
    }

    fn show(&mut self, message: &str) {
        self.shown.push(message.to_string());
    }
}
