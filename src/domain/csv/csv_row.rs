// ============================================================
// CSV ROW TYPES
// ============================================================
// Data structures representing parsed CSV content

use std::collections::HashMap;

/// A single cell in a CSV row
#[derive(Debug, Clone)]
pub struct CsvField {
    /// Normalized header used for column lookup
    pub clean_name: String,

    /// Cell value
    pub value: String,

    /// Whether the value is empty
    pub is_empty: bool,
}

impl CsvField {
    pub fn new(header: &str, value: String) -> Self {
        let is_empty = value.trim().is_empty();
        let clean_name = Self::clean_field_name(header);

        Self {
            clean_name,
            value,
            is_empty,
        }
    }

    /// Lower-case the header and collapse every run of non-alphanumerics
    /// into a single underscore: `"Q1 Rating"` becomes `q1_rating`.
    pub fn clean_field_name(name: &str) -> String {
        name.trim_start_matches('\u{feff}')
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .split('_')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// A single data row of an uploaded file
#[derive(Debug, Clone)]
pub struct CsvRow {
    /// Row index (0-based, header excluded)
    pub index: usize,

    /// All cells in header order
    pub fields: Vec<CsvField>,

    /// Normalized header -> value
    pub field_map: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(index: usize, fields: Vec<CsvField>) -> Self {
        let field_map = fields
            .iter()
            .map(|f| (f.clean_name.clone(), f.value.clone()))
            .collect();

        Self {
            index,
            fields,
            field_map,
        }
    }

    /// 1-based row number as a person reading the file would count data rows.
    pub fn row_number(&self) -> usize {
        self.index + 1
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.field_map.get(column).map(String::as_str)
    }

    /// True for separator-only lines such as `,,,,`.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.is_empty)
    }
}

/// Header plus data rows of one uploaded file
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Normalized header names in file order
    pub headers: Vec<String>,

    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cleaning() {
        assert_eq!(CsvField::clean_field_name("Q1 Rating"), "q1_rating");
        assert_eq!(CsvField::clean_field_name("\u{feff}age"), "age");
        assert_eq!(CsvField::clean_field_name("Education-Level "), "education_level");
    }

    #[test]
    fn test_field_from_raw_header() {
        let field = CsvField::new(" Sentiment Label", "  ".to_string());
        assert_eq!(field.clean_name, "sentiment_label");
        assert_eq!(field.value, "  ");
        assert!(field.is_empty);
    }

    #[test]
    fn test_row_lookup_by_clean_name() {
        let row = CsvRow::new(
            2,
            vec![
                CsvField::new("Zip Code", "10001".to_string()),
                CsvField::new("q5_open", "".to_string()),
            ],
        );
        assert_eq!(row.get("zip_code"), Some("10001"));
        assert_eq!(row.get("q5_open"), Some(""));
        assert_eq!(row.get("city"), None);
        assert_eq!(row.row_number(), 3);
        assert!(!row.is_blank());
    }
}
