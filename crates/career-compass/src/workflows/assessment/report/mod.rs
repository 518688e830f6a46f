mod export;
mod summary;
pub mod views;

pub use export::{export_scores_csv, write_scores_csv};
pub use summary::SessionReport;
