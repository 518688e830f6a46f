use std::sync::Mutex;

use super::domain::TrainingRecord;
use super::ranker::ModelArtifact;

/// Persistence seam for the classifier artifact.
pub trait ModelStore: Send + Sync {
    fn load(&self) -> Result<Option<ModelArtifact>, StoreError>;
    /// Must replace any previous artifact atomically.
    fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError>;
}

/// Append-only corpus of consented training observations.
pub trait TrainingCorpus: Send + Sync {
    fn append(&self, record: TrainingRecord) -> Result<(), StoreError>;
    fn records(&self) -> Result<Vec<TrainingRecord>, StoreError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode stored data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write csv export: {0}")]
    Csv(#[from] csv::Error),
    #[error("persisted data failed validation: {0}")]
    PersistenceCorrupt(String),
}

/// Process-local model store, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    artifact: Mutex<Option<ModelArtifact>>,
}

impl InMemoryModelStore {
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Mutex::new(Some(artifact)),
        }
    }

    pub fn current(&self) -> Option<ModelArtifact> {
        self.artifact.lock().expect("model mutex poisoned").clone()
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StoreError> {
        Ok(self.current())
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError> {
        let mut guard = self.artifact.lock().expect("model mutex poisoned");
        *guard = Some(artifact.clone());
        Ok(())
    }
}

/// Process-local training corpus.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    records: Mutex<Vec<TrainingRecord>>,
}

impl InMemoryCorpus {
    pub fn with_records(records: Vec<TrainingRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl TrainingCorpus for InMemoryCorpus {
    fn append(&self, record: TrainingRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("corpus mutex poisoned")
            .push(record);
        Ok(())
    }

    fn records(&self) -> Result<Vec<TrainingRecord>, StoreError> {
        Ok(self.records.lock().expect("corpus mutex poisoned").clone())
    }
}
