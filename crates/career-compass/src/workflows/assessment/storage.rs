use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::domain::TrainingRecord;
use super::ranker::ModelArtifact;
use super::repository::{ModelStore, StoreError, TrainingCorpus};

/// Write `bytes` to a temporary file beside `path`, then rename it into place so readers
/// never observe a partially written file.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(path)
        .map_err(|err| StoreError::Io(err.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "replaced file atomically");
    Ok(())
}

/// Pretty JSON flavour of [`write_bytes_atomic`].
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes_atomic(path, &bytes)
}

/// Classifier artifact stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<ModelArtifact>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let artifact = serde_json::from_str(&raw)
            .map_err(|err| StoreError::PersistenceCorrupt(err.to_string()))?;
        Ok(Some(artifact))
    }

    fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError> {
        write_json_atomic(&self.path, artifact)
    }
}

/// Training corpus stored as one JSON record per line.
#[derive(Debug)]
pub struct JsonLinesCorpus {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrainingCorpus for JsonLinesCorpus {
    fn append(&self, record: TrainingRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().expect("corpus mutex poisoned");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn records(&self) -> Result<Vec<TrainingRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TrainingRecord>(&line) {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %err,
                    "skipping malformed training record"
                ),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::ScoreVector;
    use chrono::Utc;

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            format_version: crate::workflows::assessment::ranker::ARTIFACT_FORMAT_VERSION,
            feature_columns: vec!["A".to_string()],
            feature_means: vec![3.0],
            feature_scales: vec![2.0],
            classes: vec!["X".to_string(), "Y".to_string()],
            weights: vec![vec![0.123456789012345], vec![-0.987654321098765]],
            biases: vec![1e-17, -3.5],
            sample_count: 2,
            trained_at: Utc::now(),
        }
    }

    #[test]
    fn missing_model_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileModelStore::new(dir.path().join("absent.json"));
        assert!(store.load().expect("load succeeds").is_none());
    }

    #[test]
    fn model_artifact_round_trips_exactly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileModelStore::new(dir.path().join("nested").join("model.json"));
        let original = artifact();

        store.save(&original).expect("save succeeds");
        let loaded = store.load().expect("load succeeds").expect("artifact present");
        assert_eq!(loaded, original);
    }

    #[test]
    fn unreadable_model_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        fs::write(&path, "{\"format_version\": 1, \"weights\": [").expect("write");

        match FileModelStore::new(&path).load() {
            Err(StoreError::PersistenceCorrupt(_)) => {}
            other => panic!("expected corrupt artifact, got {other:?}"),
        }
    }

    #[test]
    fn save_replaces_previous_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileModelStore::new(dir.path().join("model.json"));
        store.save(&artifact()).expect("first save");

        let mut updated = artifact();
        updated.sample_count = 42;
        store.save(&updated).expect("second save");

        let loaded = store.load().expect("load").expect("present");
        assert_eq!(loaded.sample_count, 42);
        let leftovers = fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(leftovers, 1, "temporary files must not linger");
    }

    #[test]
    fn corpus_appends_and_skips_malformed_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let corpus = JsonLinesCorpus::new(dir.path().join("corpus.jsonl"));
        assert!(corpus.records().expect("empty corpus").is_empty());

        let scores: ScoreVector = vec![("A".to_string(), 4.5)].into_iter().collect();
        corpus
            .append(TrainingRecord::from_scores(&scores, "Writer"))
            .expect("append");

        let mut file = OpenOptions::new()
            .append(true)
            .open(corpus.path())
            .expect("open corpus");
        writeln!(file, "not json").expect("write garbage");
        writeln!(file).expect("write blank");

        corpus
            .append(TrainingRecord::from_scores(&scores, "Coder"))
            .expect("append");

        let records = corpus.records().expect("records");
        let careers: Vec<_> = records
            .iter()
            .filter_map(|record| record.labeled_career())
            .collect();
        assert_eq!(careers, vec!["Writer", "Coder"]);
        assert_eq!(records[0].features.get("A"), Some(&4.5));
    }
}
