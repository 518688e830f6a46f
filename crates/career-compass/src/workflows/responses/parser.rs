use std::io::Read;

use serde::Deserialize;

use super::normalizer::clean_cell;

#[derive(Debug)]
pub(crate) struct SheetRow {
    /// 1-based data row number, excluding the header.
    pub(crate) row: usize,
    pub(crate) category: String,
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "Category")]
    category: String,
    #[serde(alias = "Answer", default)]
    answer: String,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<SheetRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let raw = record?;
        rows.push(SheetRow {
            row: index + 1,
            category: clean_cell(&raw.category),
            answer: clean_cell(&raw.answer),
        });
    }

    Ok(rows)
}
