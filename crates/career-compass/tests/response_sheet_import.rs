use std::fs;

use career_compass::workflows::assessment::QuestionCatalog;
use career_compass::workflows::responses::{ResponseImportError, ResponseSheetImporter};

#[test]
fn importer_reads_sheet_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("answers.csv");
    fs::write(
        &path,
        "category,answer,submitted_by\n\
Big Five - Openness,Always,student\n\
Big Five - Openness,Usually,student\n\
Numerical Aptitude,Often,student\n",
    )
    .expect("write sheet");

    let layers = ResponseSheetImporter::from_path(&path, &QuestionCatalog::standard())
        .expect("sheet imports");

    let names: Vec<_> = layers.iter().map(|layer| layer.layer.as_str()).collect();
    assert_eq!(
        names,
        vec!["Personality & Motivation", "Aptitude & Skill Assessment"]
    );
    assert_eq!(layers[0].categories[0].answers, vec!["Always", "Usually"]);
}

#[test]
fn missing_sheet_reports_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    match ResponseSheetImporter::from_path(dir.path().join("absent.csv"), &QuestionCatalog::standard()) {
        Err(ResponseImportError::Io(_)) => {}
        other => panic!("expected io error, got {other:?}"),
    }
}
