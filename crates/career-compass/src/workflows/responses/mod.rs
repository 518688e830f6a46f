//! Non-interactive answer sheets: a CSV of `category,answer` rows grouped into the same
//! per-layer form the interactive collector produces.

mod normalizer;
mod parser;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::workflows::assessment::{CategoryResponses, LayerResponses, QuestionCatalog};

use parser::SheetRow;

#[derive(Debug)]
pub enum ResponseImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownCategory { row: usize, category: String },
    BlankAnswer { row: usize, category: String },
    Empty,
}

impl std::fmt::Display for ResponseImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseImportError::Io(err) => write!(f, "failed to read answer sheet: {}", err),
            ResponseImportError::Csv(err) => write!(f, "invalid answer sheet CSV: {}", err),
            ResponseImportError::UnknownCategory { row, category } => write!(
                f,
                "row {}: category '{}' is not part of the catalog",
                row, category
            ),
            ResponseImportError::BlankAnswer { row, category } => {
                write!(f, "row {}: answer for '{}' is blank", row, category)
            }
            ResponseImportError::Empty => write!(f, "answer sheet contains no answers"),
        }
    }
}

impl std::error::Error for ResponseImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResponseImportError::Io(err) => Some(err),
            ResponseImportError::Csv(err) => Some(err),
            ResponseImportError::UnknownCategory { .. }
            | ResponseImportError::BlankAnswer { .. }
            | ResponseImportError::Empty => None,
        }
    }
}

impl From<std::io::Error> for ResponseImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ResponseImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct ResponseSheetImporter;

impl ResponseSheetImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        catalog: &QuestionCatalog,
    ) -> Result<Vec<LayerResponses>, ResponseImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, catalog)
    }

    /// Layers and categories come back in catalog order; answers keep sheet order.
    /// Layers without any answered category are omitted.
    pub fn from_reader<R: Read>(
        reader: R,
        catalog: &QuestionCatalog,
    ) -> Result<Vec<LayerResponses>, ResponseImportError> {
        let canonical: HashMap<String, &str> = catalog
            .layers()
            .iter()
            .flat_map(|layer| &layer.categories)
            .map(|category| (normalizer::category_key(&category.name), category.name.as_str()))
            .collect();

        let mut answers: HashMap<&str, Vec<String>> = HashMap::new();
        let mut total = 0usize;
        for row in parser::parse_rows(reader)? {
            let name = resolve_category(&row, &canonical)?;
            if row.answer.is_empty() {
                return Err(ResponseImportError::BlankAnswer {
                    row: row.row,
                    category: name.to_string(),
                });
            }
            answers.entry(name).or_default().push(row.answer);
            total += 1;
        }
        if total == 0 {
            return Err(ResponseImportError::Empty);
        }

        let layers: Vec<LayerResponses> = catalog
            .layers()
            .iter()
            .filter_map(|layer| {
                let categories: Vec<CategoryResponses> = layer
                    .categories
                    .iter()
                    .filter_map(|category| {
                        answers
                            .remove(category.name.as_str())
                            .map(|answers| CategoryResponses::new(category.name.clone(), answers))
                    })
                    .collect();
                (!categories.is_empty()).then(|| LayerResponses {
                    layer: layer.name.clone(),
                    categories,
                })
            })
            .collect();

        debug!(layers = layers.len(), answers = total, "imported answer sheet");
        Ok(layers)
    }
}

fn resolve_category<'a>(
    row: &SheetRow,
    canonical: &HashMap<String, &'a str>,
) -> Result<&'a str, ResponseImportError> {
    canonical
        .get(&normalizer::category_key(&row.category))
        .copied()
        .ok_or_else(|| ResponseImportError::UnknownCategory {
            row: row.row,
            category: row.category.clone(),
        })
}
