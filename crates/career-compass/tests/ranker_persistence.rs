use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use career_compass::workflows::assessment::{
    FileModelStore, LearnedRanker, ModelStore, RankerError, ScoreVector, TrainingRecord,
};
use chrono::Utc;

fn record(features: &[(&str, f64)], career: &str) -> TrainingRecord {
    TrainingRecord {
        features: features
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect::<BTreeMap<_, _>>(),
        career: Some(career.to_string()),
        recorded_at: Utc::now(),
    }
}

fn corpus() -> Vec<TrainingRecord> {
    vec![
        record(&[("Linguistic", 4.8), ("Spatial", 2.1)], "Journalism"),
        record(&[("Linguistic", 4.2), ("Spatial", 2.9)], "Journalism"),
        record(&[("Linguistic", 2.0), ("Spatial", 4.7)], "Architecture"),
        record(&[("Linguistic", 1.6), ("Logical-Mathematical", 4.9)], "Data Science"),
    ]
}

#[test]
fn saved_model_reproduces_predictions_after_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("models").join("career_model.json");

    let mut trained = LearnedRanker::new(Arc::new(FileModelStore::new(&path)));
    let summary = trained.train(&corpus()).expect("training succeeds");
    assert_eq!(summary.classes, 3);
    assert_eq!(summary.features, 3);

    let mut reloaded = LearnedRanker::new(Arc::new(FileModelStore::new(&path)));
    assert!(reloaded.load(), "persisted model loads");

    let probes: Vec<ScoreVector> = vec![
        vec![("Linguistic".to_string(), 4.5)].into_iter().collect(),
        vec![("Spatial".to_string(), 4.4), ("Linguistic".to_string(), 2.2)]
            .into_iter()
            .collect(),
        vec![("Unrelated".to_string(), 3.0)].into_iter().collect(),
    ];
    for probe in &probes {
        assert_eq!(
            trained.predict_with_confidence(probe).expect("trained predicts"),
            reloaded.predict_with_confidence(probe).expect("reloaded predicts"),
        );
    }
}

#[test]
fn corrupt_model_file_fails_open_to_untrained() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("career_model.json");
    fs::write(&path, b"{ definitely not a model").expect("write garbage");

    let mut ranker = LearnedRanker::new(Arc::new(FileModelStore::new(&path)));
    assert!(!ranker.load());
    match ranker.predict(&ScoreVector::new()) {
        Err(RankerError::ModelNotTrained) => {}
        other => panic!("expected ModelNotTrained, got {other:?}"),
    }
}

#[test]
fn failed_training_keeps_previous_artifact_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileModelStore::new(dir.path().join("career_model.json")));
    let mut ranker = LearnedRanker::new(store.clone());
    ranker.train(&corpus()).expect("training succeeds");
    let before = store.load().expect("readable").expect("present");

    let unlabeled = TrainingRecord {
        career: None,
        ..record(&[("Linguistic", 3.0)], "ignored")
    };
    assert!(matches!(
        ranker.train(&[unlabeled]),
        Err(RankerError::InsufficientTrainingData { .. })
    ));

    let after = store.load().expect("readable").expect("present");
    assert_eq!(before, after);
    assert!(ranker.is_trained());
}
