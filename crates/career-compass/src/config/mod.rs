use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub storage: StorageConfig,
    pub questionnaire: QuestionnaireConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir =
            PathBuf::from(env::var("CAREER_DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let model_path = env::var("CAREER_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("career_model.json"));
        let corpus_path = env::var("CAREER_CORPUS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("training_corpus.jsonl"));
        let results_path = env::var("CAREER_RESULTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("career_mapping_results.json"));
        let catalog_path = env::var("CAREER_CATALOG_PATH").ok().map(PathBuf::from);

        let shuffle_questions = flag_or("CAREER_SHUFFLE_QUESTIONS", true)?;

        let questions_per_category = match env::var("CAREER_QUESTIONS_PER_CATEGORY") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or(ConfigError::InvalidNumber {
                        variable: "CAREER_QUESTIONS_PER_CATEGORY",
                    })?,
            ),
            Err(_) => None,
        };

        let max_attempts = env::var("CAREER_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|attempts| *attempts > 0)
            .ok_or(ConfigError::InvalidNumber {
                variable: "CAREER_MAX_ATTEMPTS",
            })?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_file = env::var("CAREER_LOG_FILE")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let ansi = flag_or("APP_LOG_ANSI", false)?;
        let show_targets = flag_or("APP_LOG_TARGETS", false)?;

        Ok(Self {
            environment,
            storage: StorageConfig {
                data_dir,
                model_path,
                corpus_path,
                results_path,
                catalog_path,
            },
            questionnaire: QuestionnaireConfig {
                shuffle_questions,
                questions_per_category,
                max_attempts,
            },
            telemetry: TelemetryConfig {
                log_level,
                log_file,
                ansi,
                show_targets,
            },
        })
    }
}

fn flag_or(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(variable) {
        Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag { variable }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Locations of the persisted classifier, training corpus, and session output.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub model_path: PathBuf,
    pub corpus_path: PathBuf,
    pub results_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
}

/// Controls how prompts are selected and how many tries an open-ended prompt gets.
#[derive(Debug, Clone)]
pub struct QuestionnaireConfig {
    pub shuffle_questions: bool,
    pub questions_per_category: Option<usize>,
    pub max_attempts: u8,
}

/// Tracing controls. `log_file` replaces stderr as the event sink when set.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub ansi: bool,
    pub show_targets: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidFlag { variable: &'static str },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFlag { variable } => {
                write!(f, "{variable} must be one of true/false/yes/no/1/0")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
