// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, encoding fallback, and open-text analysis

mod content_analyzer;
mod csv_parser;

pub use content_analyzer::{classify_is_human, HumanTextClassifier, AI_PHRASE_DENYLIST};
pub use csv_parser::CsvParser;
