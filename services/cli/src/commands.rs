use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use career_compass::config::AppConfig;
use career_compass::error::AppError;
use career_compass::workflows::assessment::report::export_scores_csv;
use career_compass::workflows::assessment::{
    AdviceContext, Advisor, AssessmentError, LayerResponses, OfflineAdvisor, Prediction,
    QuestionCatalog, RankedCareer, RankerError, Recommendation, ResponseCollector, ScoreVector,
    SessionReport,
};
use career_compass::workflows::responses::ResponseSheetImporter;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::warn;

use crate::infra::{build_service, parse_score, FileBackedService, TerminalAnswers};

const TOP_SCORES: usize = 5;
const TOP_CAREERS: usize = 5;
const UNTRAINED_NOTE: &str = "career model not trained yet; showing rule-based careers";

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// CSV answer sheet with `category,answer` rows instead of interactive prompts
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Consent to store this session's scores and chosen career for retraining
    #[arg(long)]
    pub(crate) consent: bool,
    /// Career to record as accepted (defaults to the strongest candidate)
    #[arg(long)]
    pub(crate) choice: Option<String>,
    /// Ask prompts in catalog order
    #[arg(long)]
    pub(crate) no_shuffle: bool,
    /// Maximum prompts asked per category
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Seed for prompt shuffling, for reproducible sessions
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Also export numeric scores as `category,score` CSV
    #[arg(long)]
    pub(crate) scores_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Category score as CATEGORY=VALUE; repeat for each category
    #[arg(long = "score", value_parser = parse_score, required = true)]
    pub(crate) scores: Vec<(String, f64)>,
    /// Print the prediction as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Print the full catalog, prompts included, as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_assess(config: &AppConfig, args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        answers,
        consent,
        choice,
        no_shuffle,
        limit,
        seed,
        scores_csv,
    } = args;

    let mut service = build_service(config)?;
    service.start();
    let advisor: Arc<dyn Advisor> = Arc::new(OfflineAdvisor);

    let mut scores = ScoreVector::new();
    let (layers, consent) = match answers {
        Some(path) => {
            let layers = ResponseSheetImporter::from_path(&path, service.catalog())?;
            for layer in &layers {
                service.score_layer(layer, &mut scores)?;
            }
            (layers, consent)
        }
        None => {
            let shuffle = config.questionnaire.shuffle_questions && !no_shuffle;
            let limit = limit.or(config.questionnaire.questions_per_category);
            let catalog = session_catalog(service.catalog(), shuffle, limit, seed);
            let stdin = io::stdin();
            let mut terminal = TerminalAnswers::new(stdin.lock(), io::stdout());
            let consent = consent
                || terminal.confirm("Consent to save your data for improving guidance?")?;
            let collector =
                ResponseCollector::new(advisor.clone(), config.questionnaire.max_attempts);
            let layers =
                collect_interactively(&service, &catalog, &collector, &mut terminal, &mut scores)?;
            (layers, consent)
        }
    };

    let recommendation = service.recommend(&scores);
    let insight = advisor.summarize(AdviceContext {
        scores: &scores,
        candidates: &recommendation.candidates,
        market: &recommendation.market,
    });
    render_recommendation(&scores, &recommendation, &insight);

    let report = SessionReport::new(layers, scores.clone(), &recommendation, TOP_SCORES)
        .with_consent(consent)
        .with_insight(insight);
    report.write_json(&config.storage.results_path)?;
    println!("\nSession saved to {}", config.storage.results_path.display());

    if let Some(path) = scores_csv {
        export_scores_csv(&scores, &path)?;
        println!("Scores exported to {}", path.display());
    }

    if consent {
        record_and_retrain(&mut service, &scores, &recommendation, choice)?;
    }

    Ok(())
}

fn session_catalog(
    catalog: &QuestionCatalog,
    shuffle: bool,
    limit: Option<usize>,
    seed: Option<u64>,
) -> QuestionCatalog {
    if shuffle {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        catalog.sample(&mut rng, limit)
    } else {
        match limit {
            Some(limit) => catalog.truncated(limit),
            None => catalog.clone(),
        }
    }
}

fn collect_interactively<R, W>(
    service: &FileBackedService,
    catalog: &QuestionCatalog,
    collector: &ResponseCollector,
    terminal: &mut TerminalAnswers<R, W>,
    scores: &mut ScoreVector,
) -> Result<Vec<LayerResponses>, AppError>
where
    R: BufRead,
    W: Write,
{
    let mut layers = Vec::with_capacity(catalog.layers().len());
    for (index, layer) in catalog.layers().iter().enumerate() {
        terminal.heading(&format!(
            "Layer {} - {} ({})",
            index + 1,
            layer.name,
            layer.mode().label()
        ))?;

        let recommendation = service.recommend(scores);
        let responses = collector.collect_layer(
            layer,
            terminal,
            AdviceContext {
                scores,
                candidates: &recommendation.candidates,
                market: &recommendation.market,
            },
        )?;
        service.score_layer(&responses, scores)?;
        layers.push(responses);
    }
    Ok(layers)
}

fn record_and_retrain(
    service: &mut FileBackedService,
    scores: &ScoreVector,
    recommendation: &Recommendation,
    choice: Option<String>,
) -> Result<(), AppError> {
    let Some(career) = choice.or_else(|| recommendation.leading_career().map(str::to_string))
    else {
        println!("No career to record; training data unchanged.");
        return Ok(());
    };

    service.record_outcome(scores, &career, true)?;
    println!("Recorded '{career}' for future guidance.");

    match service.retrain() {
        Ok(summary) => {
            println!(
                "Career model retrained on {} sessions across {} careers{}.",
                summary.samples,
                summary.classes,
                if summary.low_confidence {
                    " (low confidence: only one career seen so far)"
                } else {
                    ""
                }
            );
            match service.predict(scores) {
                Ok(prediction) => println!(
                    "Learned suggestion: {} ({:.0}% confidence)",
                    prediction.career,
                    prediction.confidence * 100.0
                ),
                Err(err) => warn!(error = %err, "prediction after retrain failed"),
            }
        }
        Err(err) => {
            warn!(error = %err, "retraining skipped");
            println!("Career model not retrained: {err}");
        }
    }
    Ok(())
}

fn render_recommendation(scores: &ScoreVector, recommendation: &Recommendation, insight: &str) {
    println!("\nTop scores:");
    let top = scores.top_numeric(TOP_SCORES);
    if top.is_empty() {
        println!("- none");
    }
    for (category, score) in top {
        println!("- {category}: {score:.2}");
    }

    println!("\nRecommended careers:");
    if recommendation.ranked.is_empty() {
        println!("- none scored at or above the threshold");
    }
    for ranked in recommendation.ranked.iter().take(TOP_CAREERS) {
        println!(
            "- {} (via {} at {:.2})",
            ranked.career, ranked.category, ranked.score
        );
    }

    if !recommendation.market.is_empty() {
        println!("\nMarket insights:");
    }
    for market in &recommendation.market {
        println!(
            "- {}: Demand: {}, Salary: {}, Skills: {}, Outlook: {}",
            market.career,
            market.insight.demand,
            market.insight.salary_range,
            market.insight.skills.join(", "),
            market.insight.outlook
        );
    }

    if let Some(learned) = &recommendation.learned {
        println!(
            "\nLearned suggestion: {} ({:.0}% confidence)",
            learned.career,
            learned.confidence * 100.0
        );
    }
    println!("\nInsight: {insight}");
}

pub(crate) fn run_train(config: &AppConfig) -> Result<(), AppError> {
    let mut service = build_service(config)?;
    service.start();
    let summary = service.retrain()?;

    println!("Career model trained");
    println!("- samples: {}", summary.samples);
    println!("- careers: {}", summary.classes);
    println!("- features: {}", summary.features);
    println!(
        "- training accuracy: {:.0}%",
        summary.training_accuracy * 100.0
    );
    if summary.low_confidence {
        println!("- warning: only one career in the corpus; predictions are low confidence");
    }
    println!("Saved to {}", config.storage.model_path.display());
    Ok(())
}

pub(crate) fn run_predict(config: &AppConfig, args: PredictArgs) -> Result<(), AppError> {
    let repeated = {
        let mut seen = BTreeSet::new();
        args.scores
            .iter()
            .find(|(category, _)| !seen.insert(category.as_str()))
            .map(|(category, _)| category.clone())
    };
    if let Some(category) = repeated {
        return Err(AppError::Usage(format!(
            "category '{category}' was given more than once"
        )));
    }

    let mut service = build_service(config)?;
    service.start();
    let scores: ScoreVector = args.scores.into_iter().collect();
    let outcome = predict_or_fall_back(&service, &scores)?;

    if args.json {
        println!("{}", to_json(&outcome)?);
        return Ok(());
    }
    match &outcome {
        PredictOutcome::Learned(prediction) => println!(
            "{} ({:.0}% confidence, {} of {} categories recognised)",
            prediction.career,
            prediction.confidence * 100.0,
            prediction.feature_overlap,
            scores.len()
        ),
        PredictOutcome::RuleBased { note, careers } => {
            println!("Note: {note}.");
            if careers.is_empty() {
                println!("- none scored at or above the threshold");
            }
            for ranked in careers.iter().take(TOP_CAREERS) {
                println!(
                    "- {} (via {} at {:.2})",
                    ranked.career, ranked.category, ranked.score
                );
            }
        }
    }
    Ok(())
}

/// What `predict` reports: the learned label, or the rule-based careers before any model exists.
#[derive(Debug, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
enum PredictOutcome {
    Learned(Prediction),
    RuleBased {
        note: &'static str,
        careers: Vec<RankedCareer>,
    },
}

fn predict_or_fall_back(
    service: &FileBackedService,
    scores: &ScoreVector,
) -> Result<PredictOutcome, AppError> {
    match service.predict(scores) {
        Ok(prediction) => Ok(PredictOutcome::Learned(prediction)),
        Err(AssessmentError::Ranker(RankerError::ModelNotTrained)) => {
            warn!("{UNTRAINED_NOTE}");
            Ok(PredictOutcome::RuleBased {
                note: UNTRAINED_NOTE,
                careers: service.recommend(scores).ranked,
            })
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn run_catalog(config: &AppConfig, args: CatalogArgs) -> Result<(), AppError> {
    let service = build_service(config)?;
    if args.json {
        println!("{}", to_json(service.catalog())?);
        return Ok(());
    }
    for (index, layer) in service.catalog().layers().iter().enumerate() {
        println!(
            "Layer {} - {} ({}, {} prompts)",
            index + 1,
            layer.name,
            layer.mode().label(),
            layer.prompt_count()
        );
        for category in &layer.categories {
            println!("  - {} ({})", category.name, category.prompts.len());
        }
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Io(err.into()))
}
