use crate::commands::{
    run_assess, run_catalog, run_predict, run_train, AssessArgs, CatalogArgs, PredictArgs,
};
use career_compass::config::AppConfig;
use career_compass::error::AppError;
use career_compass::telemetry;
use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "Career Compass",
    about = "Layered career questionnaire with rule-based and learned career suggestions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the questionnaire interactively or from an answer sheet (default command)
    Assess(AssessArgs),
    /// Retrain the career model from the consented training corpus
    Train,
    /// Predict a career from category scores using the trained model
    Predict(PredictArgs),
    /// List the questionnaire layers and categories
    Catalog(CatalogArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    debug!(environment = ?config.environment, "configuration loaded");

    let command = cli
        .command
        .unwrap_or_else(|| Command::Assess(AssessArgs::default()));

    match command {
        Command::Assess(args) => run_assess(&config, args),
        Command::Train => run_train(&config),
        Command::Predict(args) => run_predict(&config, args),
        Command::Catalog(args) => run_catalog(&config, args),
    }
}
