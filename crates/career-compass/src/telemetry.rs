use crate::config::TelemetryConfig;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    LogFile { path: PathBuf, source: io::Error },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log level/filter '{value}'")
            }
            TelemetryError::LogFile { path, source } => {
                write!(f, "cannot open log file {}: {source}", path.display())
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::LogFile { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Install the global subscriber.
///
/// Events go to stderr unless a log file is configured, so they never interleave with
/// questionnaire prompts on stdout. A valid `RUST_LOG` overrides the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), config)?;
    let writer = make_writer(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(config.show_targets)
        .compact()
        .with_ansi(config.ansi && config.log_file.is_none())
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn build_filter(
    from_env: Option<String>,
    config: &TelemetryConfig,
) -> Result<EnvFilter, TelemetryError> {
    if let Some(directives) = from_env.filter(|directives| !directives.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return Ok(filter);
        }
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

fn make_writer(config: &TelemetryConfig) -> Result<BoxMakeWriter, TelemetryError> {
    let Some(path) = &config.log_file else {
        return Ok(BoxMakeWriter::new(io::stderr));
    };
    let log_file_error = |source| TelemetryError::LogFile {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(log_file_error)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_file_error)?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}
