use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::blueprint::CareerMappingTable;
use super::domain::{Score, ScoreVector};

/// Inclusive lower bound a category mean must reach before its careers are surfaced.
pub const HIGH_SCORE_THRESHOLD: f64 = 4.0;

/// Applies the threshold rule to a score vector against the career table.
#[derive(Debug, Clone)]
pub struct CareerMapper {
    table: Arc<CareerMappingTable>,
}

impl CareerMapper {
    pub fn new(table: Arc<CareerMappingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CareerMappingTable {
        &self.table
    }

    pub fn map(&self, scores: &ScoreVector) -> CareerCandidateSet {
        let mut candidates = CareerCandidateSet::default();

        for (category, score) in scores.iter() {
            let value = match score {
                Score::Numeric(value) if *value >= HIGH_SCORE_THRESHOLD => *value,
                Score::Numeric(_) | Score::Textual(_) => continue,
            };
            if let Some(careers) = self.table.careers_for(category) {
                for career in careers {
                    candidates.add(career, category, value);
                }
            }
        }

        candidates
    }
}

/// Deduplicated careers surfaced by the threshold rule.
///
/// Iteration is lexicographic by label. `ranked` orders by the strongest supporting
/// category score instead, breaking ties lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerCandidateSet {
    support: BTreeMap<String, CandidateSupport>,
}

/// Best category backing a candidate career.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSupport {
    pub category: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCareer {
    pub career: String,
    pub category: String,
    pub score: f64,
}

impl CareerCandidateSet {
    fn add(&mut self, career: &str, category: &str, score: f64) {
        let stronger = self
            .support
            .get(career)
            .map(|existing| score > existing.score)
            .unwrap_or(true);
        if stronger {
            self.support.insert(
                career.to_string(),
                CandidateSupport {
                    category: category.to_string(),
                    score,
                },
            );
        }
    }

    pub fn contains(&self, career: &str) -> bool {
        self.support.contains_key(career)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.support.keys().map(String::as_str)
    }

    pub fn support_for(&self, career: &str) -> Option<&CandidateSupport> {
        self.support.get(career)
    }

    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    pub fn ranked(&self) -> Vec<RankedCareer> {
        let mut ranked: Vec<RankedCareer> = self
            .support
            .iter()
            .map(|(career, support)| RankedCareer {
                career: career.clone(),
                category: support.category.clone(),
                score: support.score,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.career.cmp(&b.career))
        });
        ranked
    }

    pub fn top(&self, limit: usize) -> Vec<RankedCareer> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }
}
