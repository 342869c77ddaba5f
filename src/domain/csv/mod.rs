// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Value objects for uploaded survey rows
// No I/O, no async, no external dependencies

mod csv_row;

pub use csv_row::{CsvField, CsvRow, CsvTable};
