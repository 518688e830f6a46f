use std::io::{BufRead, Write};
use std::sync::Arc;

use career_compass::config::AppConfig;
use career_compass::error::AppError;
use career_compass::workflows::assessment::{
    AnswerSource, AssessmentBlueprint, CareerAssessmentService, CollectError, FileModelStore,
    JsonLinesCorpus, PromptRequest,
};
use tracing::info;

pub(crate) type FileBackedService = CareerAssessmentService<FileModelStore, JsonLinesCorpus>;

/// Build the service over the configured model and corpus files.
pub(crate) fn build_service(config: &AppConfig) -> Result<FileBackedService, AppError> {
    let blueprint = match &config.storage.catalog_path {
        Some(path) => {
            info!(path = %path.display(), "loading custom catalog");
            AssessmentBlueprint::from_path(path)?
        }
        None => AssessmentBlueprint::standard(),
    };
    let store = Arc::new(FileModelStore::new(&config.storage.model_path));
    let corpus = Arc::new(JsonLinesCorpus::new(&config.storage.corpus_path));
    Ok(CareerAssessmentService::new(blueprint, store, corpus))
}

/// Parses `CATEGORY=VALUE` pairs given to `--score`.
pub(crate) fn parse_score(raw: &str) -> Result<(String, f64), String> {
    let (category, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected CATEGORY=VALUE, got '{raw}'"))?;
    let category = category.trim();
    if category.is_empty() {
        return Err(format!("missing category in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite score", value));
    }
    Ok((category.to_string(), value))
}

/// Line-oriented prompts over any reader/writer pair, normally stdin and stdout.
pub(crate) struct TerminalAnswers<R, W> {
    input: R,
    output: W,
}

impl<R, W> TerminalAnswers<R, W>
where
    R: BufRead,
    W: Write,
{
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub(crate) fn confirm(&mut self, question: &str) -> Result<bool, CollectError> {
        write!(self.output, "{question} (yes/no): ")?;
        self.output.flush()?;
        let line = self.read_line()?;
        Ok(matches!(
            line.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }

    pub(crate) fn heading(&mut self, text: &str) -> Result<(), CollectError> {
        writeln!(self.output, "\n{text}")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, CollectError> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R, W> AnswerSource for TerminalAnswers<R, W>
where
    R: BufRead,
    W: Write,
{
    fn ask(&mut self, request: &PromptRequest<'_>) -> Result<String, CollectError> {
        if request.attempt == 1 {
            writeln!(self.output, "{}", request.prompt)?;
        }
        write!(self.output, "Enter ({}): ", request.answer_hint())?;
        self.output.flush()?;
        self.read_line()?.ok_or_else(|| CollectError::Exhausted {
            category: request.category.to_string(),
        })
    }

    fn show(&mut self, message: &str) {
        // Best effort: a closed stdout is reported by the next `ask`.
        let _ = writeln!(self.output, "{message}");
    }
}
