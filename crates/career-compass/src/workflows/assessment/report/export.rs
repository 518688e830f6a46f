use std::io::Write;
use std::path::Path;

use super::super::domain::ScoreVector;
use super::super::repository::StoreError;
use super::super::storage::write_bytes_atomic;

/// Write numeric scores as `category,score` rows in category order.
pub fn write_scores_csv<W: Write>(scores: &ScoreVector, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["category", "score"])?;
    for (category, score) in scores.numeric() {
        csv_writer.write_record([category.to_string(), score.to_string()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_scores_csv(scores: &ScoreVector, path: &Path) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    write_scores_csv(scores, &mut buffer)?;
    write_bytes_atomic(path, &buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::Score;

    #[test]
    fn textual_scores_are_left_out_of_the_export() {
        let mut scores: ScoreVector = vec![("Spatial".to_string(), 3.5), ("Linguistic".to_string(), 4.0)]
            .into_iter()
            .collect();
        scores
            .insert("Self Synthesis", Score::Textual(vec!["notes".to_string()]))
            .expect("insert");

        let mut buffer = Vec::new();
        write_scores_csv(&scores, &mut buffer).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text, "category,score\nLinguistic,4\nSpatial,3.5\n");
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores.csv");
        let scores: ScoreVector = vec![("A".to_string(), 5.0)].into_iter().collect();

        export_scores_csv(&scores, &path).expect("export");
        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.starts_with("category,score\n"));
        assert!(text.contains("A,5\n"));
    }
}
