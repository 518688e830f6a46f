/// Strip invisible characters and collapse internal whitespace.
pub(crate) fn clean_cell(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive key used to match sheet categories against the catalog.
pub(crate) fn category_key(value: &str) -> String {
    clean_cell(value).to_lowercase()
}
