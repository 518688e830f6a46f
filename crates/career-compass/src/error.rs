use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::assessment::{AssessmentError, CatalogError, CollectError, StoreError};
use crate::workflows::responses::ResponseImportError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Catalog(CatalogError),
    Import(ResponseImportError),
    Collect(CollectError),
    Assessment(AssessmentError),
    Store(StoreError),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Import(err) => write!(f, "answer sheet error: {}", err),
            AppError::Collect(err) => write!(f, "response collection error: {}", err),
            AppError::Assessment(err) => write!(f, "assessment error: {}", err),
            AppError::Store(err) => write!(f, "storage error: {}", err),
            AppError::Usage(message) => write!(f, "invalid usage: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Collect(err) => Some(err),
            AppError::Assessment(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ResponseImportError> for AppError {
    fn from(value: ResponseImportError) -> Self {
        Self::Import(value)
    }
}

impl From<CollectError> for AppError {
    fn from(value: CollectError) -> Self {
        Self::Collect(value)
    }
}

impl From<AssessmentError> for AppError {
    fn from(value: AssessmentError) -> Self {
        Self::Assessment(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
