use std::collections::{BTreeMap, BTreeSet};

use super::super::domain::{ScoreVector, TrainingRecord};

/// Ordered numeric feature columns fixed at fit time.
///
/// Projection imputes 0.0 for any column missing from the input, both when building
/// the training matrix and at prediction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureColumns {
    names: Vec<String>,
}

impl FeatureColumns {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TrainingRecord>,
    {
        let names: BTreeSet<&str> = records
            .into_iter()
            .flat_map(|record| record.features.keys().map(String::as_str))
            .collect();
        Self {
            names: names.into_iter().map(str::to_string).collect(),
        }
    }

    /// Rebuild from persisted names; `None` when a name repeats.
    pub fn from_names(names: Vec<String>) -> Option<Self> {
        let distinct = names.iter().collect::<BTreeSet<_>>().len();
        (distinct == names.len()).then_some(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn project(&self, features: &BTreeMap<String, f64>) -> Vec<f64> {
        self.names
            .iter()
            .map(|name| features.get(name).copied().unwrap_or(0.0))
            .collect()
    }

    pub fn project_scores(&self, scores: &ScoreVector) -> Vec<f64> {
        self.names
            .iter()
            .map(|name| {
                scores
                    .get(name)
                    .and_then(|score| score.as_numeric())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Number of fitted columns for which `scores` carries a numeric value.
    pub fn overlap(&self, scores: &ScoreVector) -> usize {
        self.names
            .iter()
            .filter(|name| {
                scores
                    .get(name.as_str())
                    .and_then(|score| score.as_numeric())
                    .is_some()
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::Score;
    use chrono::Utc;

    fn record(features: &[(&str, f64)], career: &str) -> TrainingRecord {
        TrainingRecord {
            features: features
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            career: Some(career.to_string()),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn columns_are_the_sorted_union_of_record_features() {
        let records = [
            record(&[("B", 1.0)], "X"),
            record(&[("A", 2.0), ("C", 3.0)], "Y"),
        ];
        let columns = FeatureColumns::from_records(&records);
        assert_eq!(columns.names(), ["A", "B", "C"]);
        assert_eq!(columns.project(&records[0].features), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn score_projection_imputes_missing_and_textual_values() {
        let columns = FeatureColumns::from_names(vec!["A".into(), "B".into(), "T".into()])
            .expect("unique names");
        let mut scores: ScoreVector = vec![("A".to_string(), 4.5), ("Z".to_string(), 1.0)]
            .into_iter()
            .collect();
        scores
            .insert("T", Score::Textual(vec!["hello".to_string()]))
            .expect("insert");

        assert_eq!(columns.project_scores(&scores), vec![4.5, 0.0, 0.0]);
        assert_eq!(columns.overlap(&scores), 1);
    }

    #[test]
    fn from_names_rejects_duplicates() {
        assert!(FeatureColumns::from_names(vec!["A".into(), "A".into()]).is_none());
    }
}
