use std::sync::Arc;

use tracing::{debug, warn};

use super::blueprint::{LayerDefinition, MarketInsight};
use super::domain::{CategoryResponses, LayerMode, LayerResponses, LikertAnswer, ScoreVector};
use super::mapping::CareerCandidateSet;
use super::scoring::parse_likert;

/// Command on open-ended prompts that asks the advisor why the prompt matters.
pub const HELP_COMMAND: &str = "help";
/// Command on open-ended prompts that asks the advisor for an answer idea.
pub const SUGGEST_COMMAND: &str = "suggest";

/// One prompt presented to an [`AnswerSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest<'a> {
    pub layer: &'a str,
    pub category: &'a str,
    pub prompt: &'a str,
    pub mode: LayerMode,
    /// 1-based attempt counter for this prompt.
    pub attempt: u32,
    /// Previous rejected answer, if this is a re-ask.
    pub rejected: Option<String>,
}

impl PromptRequest<'_> {
    /// Hint shown next to the prompt describing what the source may answer.
    pub fn answer_hint(&self) -> String {
        match self.mode {
            LayerMode::Likert => LikertAnswer::scale_hint(),
            LayerMode::OpenEnded => {
                format!("'{HELP_COMMAND}', '{SUGGEST_COMMAND}', or your answer")
            }
        }
    }
}

/// Supplies raw answers, e.g. an interactive terminal or a scripted sequence.
pub trait AnswerSource {
    fn ask(&mut self, request: &PromptRequest<'_>) -> Result<String, CollectError>;

    /// Relay advisor output or validation feedback to whoever is answering.
    fn show(&mut self, _message: &str) {}
}

/// Snapshot of the session so far, handed to the advisor for context.
#[derive(Debug, Clone, Copy)]
pub struct AdviceContext<'a> {
    pub scores: &'a ScoreVector,
    pub candidates: &'a CareerCandidateSet,
    pub market: &'a [MarketInsight],
}

/// Guidance provider behind the `help` and `suggest` commands.
pub trait Advisor: Send + Sync {
    fn explain(&self, prompt: &str) -> String;
    fn suggest(&self, prompt: &str, context: AdviceContext<'_>) -> String;
    /// One-line closing insight for the whole session.
    fn summarize(&self, context: AdviceContext<'_>) -> String;
}

/// Deterministic templated guidance. Never calls out to a network service.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl Advisor for OfflineAdvisor {
    fn explain(&self, prompt: &str) -> String {
        format!(
            "This question links how you see yourself to the kind of work that suits you: \"{prompt}\". \
             Answer in your own words; there are no wrong answers."
        )
    }

    fn suggest(&self, _prompt: &str, context: AdviceContext<'_>) -> String {
        let top_trait = context
            .scores
            .top_numeric(1)
            .first()
            .map(|(category, _)| category.to_string())
            .unwrap_or_else(|| "your top strengths".to_string());
        let top_career = context
            .candidates
            .top(1)
            .into_iter()
            .next()
            .map(|ranked| ranked.career)
            .unwrap_or_else(|| "a related path".to_string());
        format!("Given your interest in {top_trait}, you might explore {top_career}.")
    }

    fn summarize(&self, context: AdviceContext<'_>) -> String {
        let top = context.scores.top_numeric(1);
        let Some((top_trait, _)) = top.first() else {
            return "Not enough data to suggest careers.".to_string();
        };
        if context.candidates.is_empty() {
            return "Not enough data to suggest careers.".to_string();
        }
        let careers: Vec<String> = context
            .candidates
            .top(3)
            .into_iter()
            .map(|ranked| ranked.career)
            .collect();
        let mut summary = format!(
            "You scored highly in {top_trait}. Consider: {}.",
            careers.join(", ")
        );
        if let Some(market) = context.market.iter().find(|market| market.listed) {
            summary.push_str(&format!(
                " {} calls for skills like {}, and the job outlook is {}.",
                market.career,
                market.insight.skills.join(", "),
                market.insight.outlook
            ));
        }
        summary
    }
}

/// Walks a layer's prompts against an [`AnswerSource`], validating as it goes.
#[derive(Clone)]
pub struct ResponseCollector {
    advisor: Arc<dyn Advisor>,
    max_attempts: u8,
}

impl ResponseCollector {
    /// `max_attempts` bounds open-ended prompts only. Likert prompts are re-asked until the
    /// answer is on the scale or the source runs dry.
    pub fn new(advisor: Arc<dyn Advisor>, max_attempts: u8) -> Self {
        Self {
            advisor,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// Likert answers are normalized to their scale label; open-ended answers are trimmed.
    pub fn collect_layer<S>(
        &self,
        layer: &LayerDefinition,
        source: &mut S,
        context: AdviceContext<'_>,
    ) -> Result<LayerResponses, CollectError>
    where
        S: AnswerSource + ?Sized,
    {
        let mode = layer.mode();
        let mut categories = Vec::with_capacity(layer.categories.len());

        for category in &layer.categories {
            let mut answers = Vec::with_capacity(category.prompts.len());
            for prompt in &category.prompts {
                let request = PromptRequest {
                    layer: &layer.name,
                    category: &category.name,
                    prompt,
                    mode,
                    attempt: 1,
                    rejected: None,
                };
                let answer = match mode {
                    LayerMode::Likert => self.ask_likert(request, source)?,
                    LayerMode::OpenEnded => self.ask_open(request, source, context)?,
                };
                answers.push(answer);
            }
            categories.push(CategoryResponses::new(category.name.clone(), answers));
        }

        debug!(
            layer = %layer.name,
            categories = categories.len(),
            "collected layer responses"
        );
        Ok(LayerResponses {
            layer: layer.name.clone(),
            categories,
        })
    }

    fn ask_likert<S>(
        &self,
        mut request: PromptRequest<'_>,
        source: &mut S,
    ) -> Result<String, CollectError>
    where
        S: AnswerSource + ?Sized,
    {
        loop {
            let raw = source.ask(&request)?;
            match parse_likert(request.category, &raw) {
                Ok(answer) => return Ok(answer.label().to_string()),
                Err(err) => {
                    warn!(category = request.category, attempt = request.attempt, "invalid likert answer");
                    source.show(&format!("{err}. Try again ({}).", LikertAnswer::scale_hint()));
                    request.rejected = Some(raw);
                    request.attempt = request.attempt.saturating_add(1);
                }
            }
        }
    }

    fn ask_open<S>(
        &self,
        mut request: PromptRequest<'_>,
        source: &mut S,
        context: AdviceContext<'_>,
    ) -> Result<String, CollectError>
    where
        S: AnswerSource + ?Sized,
    {
        while request.attempt <= u32::from(self.max_attempts) {
            let raw = source.ask(&request)?;
            let answer = raw.trim();
            if answer.eq_ignore_ascii_case(HELP_COMMAND) {
                source.show(&self.advisor.explain(request.prompt));
            } else if answer.eq_ignore_ascii_case(SUGGEST_COMMAND) {
                source.show(&self.advisor.suggest(request.prompt, context));
            } else if answer.is_empty() {
                source.show("Please write a short answer.");
            } else {
                return Ok(answer.to_string());
            }
            request.rejected = Some(raw);
            request.attempt = request.attempt.saturating_add(1);
        }
        Err(self.too_many(request.category))
    }

    fn too_many(&self, category: &str) -> CollectError {
        CollectError::TooManyAttempts {
            category: category.to_string(),
            attempts: self.max_attempts,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("no usable answer for category '{category}' after {attempts} attempts")]
    TooManyAttempts { category: String, attempts: u8 },
    #[error("answer source ended before category '{category}' was complete")]
    Exhausted { category: String },
    #[error("failed to read answer: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::workflows::assessment::blueprint::{
        CareerInsightTable, CareerMappingTable, CategoryPrompts,
    };
    use crate::workflows::assessment::mapping::CareerMapper;

    struct Scripted {
        answers: VecDeque<&'static str>,
        shown: Vec<String>,
        attempts: Vec<u32>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                shown: Vec::new(),
                attempts: Vec::new(),
            }
        }
    }

    impl AnswerSource for Scripted {
        fn ask(&mut self, request: &PromptRequest<'_>) -> Result<String, CollectError> {
            self.attempts.push(request.attempt);
            self.answers
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| CollectError::Exhausted {
                    category: request.category.to_string(),
                })
        }

        fn show(&mut self, message: &str) {
            self.shown.push(message.to_string());
        }
    }

    fn layer(open_ended: bool, prompts: &[&str]) -> LayerDefinition {
        LayerDefinition {
            name: "Layer".to_string(),
            open_ended,
            categories: vec![CategoryPrompts {
                name: "Category".to_string(),
                prompts: prompts.iter().map(|p| p.to_string()).collect(),
            }],
        }
    }

    fn collect(
        layer: &LayerDefinition,
        source: &mut Scripted,
        max_attempts: u8,
    ) -> Result<LayerResponses, CollectError> {
        let scores = ScoreVector::new();
        let candidates = CareerCandidateSet::default();
        ResponseCollector::new(Arc::new(OfflineAdvisor), max_attempts).collect_layer(
            layer,
            source,
            AdviceContext {
                scores: &scores,
                candidates: &candidates,
                market: &[],
            },
        )
    }

    #[test]
    fn likert_answers_are_reasked_until_valid() {
        let layer = layer(false, &["Q1", "Q2"]);
        let mut source = Scripted::new(&["maybe", "often", " ALWAYS "]);

        let responses = collect(&layer, &mut source, 5).expect("collects");
        assert_eq!(responses.categories[0].answers, vec!["Often", "Always"]);
        assert_eq!(source.attempts, vec![1, 2, 1]);
        assert_eq!(source.shown.len(), 1);
    }

    #[test]
    fn likert_prompts_are_not_bounded_by_max_attempts() {
        let layer = layer(false, &["Q1"]);
        let mut script = vec!["maybe"; 300];
        script.push("Often");

        for max_attempts in [5, u8::MAX] {
            let mut source = Scripted::new(&script);
            let responses = collect(&layer, &mut source, max_attempts).expect("collects");
            assert_eq!(responses.categories[0].answers, vec!["Often"]);
            assert_eq!(source.attempts.len(), 301);
            assert_eq!(source.attempts.last(), Some(&301));
        }
    }

    #[test]
    fn open_ended_gives_up_after_max_attempts() {
        let layer = layer(true, &["Q1"]);
        let mut source = Scripted::new(&["help", "  ", "never read"]);

        match collect(&layer, &mut source, 2) {
            Err(CollectError::TooManyAttempts { category, attempts }) => {
                assert_eq!(category, "Category");
                assert_eq!(attempts, 2);
            }
            other => panic!("expected TooManyAttempts, got {other:?}"),
        }
    }

    #[test]
    fn open_ended_commands_route_to_advisor() {
        let layer = layer(true, &["What drives you?"]);
        let mut source = Scripted::new(&["help", "SUGGEST", "  I like building things  "]);

        let responses = collect(&layer, &mut source, 5).expect("collects");
        assert_eq!(
            responses.categories[0].answers,
            vec!["I like building things"]
        );
        assert_eq!(source.shown.len(), 2);
        assert!(source.shown[0].contains("What drives you?"));
        assert!(source.shown[1].contains("a related path"));
    }

    #[test]
    fn exhausted_source_surfaces_error() {
        let layer = layer(false, &["Q1", "Q2"]);
        let mut source = Scripted::new(&["Never"]);
        assert!(matches!(
            collect(&layer, &mut source, 3),
            Err(CollectError::Exhausted { .. })
        ));
    }

    #[test]
    fn offline_summary_names_top_trait_and_careers() {
        let scores: ScoreVector = vec![("Linguistic".to_string(), 4.6), ("Spatial".to_string(), 3.0)]
            .into_iter()
            .collect();
        let mapper = CareerMapper::new(Arc::new(CareerMappingTable::standard()));
        let candidates = mapper.map(&scores);
        let insights = CareerInsightTable::standard();
        let market: Vec<MarketInsight> = candidates
            .top(3)
            .iter()
            .map(|ranked| insights.describe(&ranked.career))
            .collect();
        let context = AdviceContext {
            scores: &scores,
            candidates: &candidates,
            market: &market,
        };

        let summary = OfflineAdvisor.summarize(context);
        assert!(summary.starts_with("You scored highly in Linguistic."));
        // Content Writing leads alphabetically but has no insight entry.
        assert!(summary.ends_with(
            "Journalism calls for skills like Writing, Research, \
             and the job outlook is Moderate demand, competitive."
        ));

        let unlisted = [insights.describe("Cartography")];
        let without_insight = OfflineAdvisor.summarize(AdviceContext {
            market: &unlisted,
            ..context
        });
        assert!(!without_insight.contains("N/A"));

        let empty = ScoreVector::new();
        let none = CareerCandidateSet::default();
        assert_eq!(
            OfflineAdvisor.summarize(AdviceContext {
                scores: &empty,
                candidates: &none,
                market: &[],
            }),
            "Not enough data to suggest careers."
        );
    }
}
