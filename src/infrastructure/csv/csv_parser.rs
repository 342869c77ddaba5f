// ============================================================
// CSV PARSER
// ============================================================
// Parse uploaded CSV bytes with encoding fallback and error handling

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;

use crate::domain::csv::{CsvField, CsvRow, CsvTable};
use crate::domain::error::AppError;

/// CSV parser for survey uploads
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse raw upload bytes into a header and data rows
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<CsvTable, AppError> {
        let content = Self::decode(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<CsvTable, AppError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Short rows read missing cells as empty
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::MalformedData(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let clean_headers: Vec<String> = headers
            .iter()
            .map(CsvField::clean_field_name)
            .collect();
        if clean_headers.iter().all(|header| header.is_empty()) {
            return Err(AppError::MalformedData(
                "CSV file has no header row".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::MalformedData(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            let row = self.parse_row(index, &headers, &record);
            if !row.is_blank() {
                rows.push(row);
            }
        }

        Ok(CsvTable {
            headers: clean_headers,
            rows,
        })
    }

    /// UTF-8 first (leading BOM dropped), Windows-1252 for legacy spreadsheet exports.
    fn decode(bytes: &[u8]) -> Cow<'_, str> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(content) => Cow::Borrowed(content),
            Err(_) => {
                let (content, _, _) = WINDOWS_1252.decode(bytes);
                tracing::warn!("Upload is not valid UTF-8, decoded as Windows-1252");
                content
            }
        }
    }

    fn parse_row(&self, index: usize, headers: &StringRecord, record: &StringRecord) -> CsvRow {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = record.get(idx).unwrap_or("").to_string();
                CsvField::new(header, value)
            })
            .collect();

        CsvRow::new(index, fields)
    }
}
