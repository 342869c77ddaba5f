use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::csv::CsvRow;
use crate::domain::error::{AppError, Result};
use crate::domain::survey::{SentimentCounts, SurveyInput, SurveyRecord};
use crate::domain::survey_query::IngestSummary;
use crate::infrastructure::csv::{CsvParser, HumanTextClassifier};
use crate::infrastructure::db::SurveyStore;

/// Columns an upload must carry. `q3_open` and `q5_open` may be absent.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "age",
    "gender",
    "zip_code",
    "city",
    "state",
    "income",
    "education_level",
    "q1_rating",
    "q2_rating",
    "q4_rating",
    "sentiment_label",
];

/// Plain integers, optionally written with a zero fraction (`34.0`).
static INTEGER_CELL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?[0-9]+)(\.0+)?$").unwrap());

pub struct SurveyIngestionUseCase {
    store: Arc<dyn SurveyStore>,
    parser: CsvParser,
    classifier: HumanTextClassifier,
    replace_lock: Mutex<()>,
}

impl SurveyIngestionUseCase {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self::with_classifier(store, HumanTextClassifier::default())
    }

    pub fn with_classifier(store: Arc<dyn SurveyStore>, classifier: HumanTextClassifier) -> Self {
        Self {
            store,
            parser: CsvParser::default(),
            classifier,
            replace_lock: Mutex::new(()),
        }
    }

    /// Parse, validate and classify every row, then replace the whole dataset.
    /// Nothing is written unless every row is valid.
    pub async fn ingest(&self, bytes: &[u8], filename: Option<&str>) -> Result<IngestSummary> {
        if let Some(filename) = filename {
            check_filename(filename)?;
        }

        let table = self.parser.parse_bytes(bytes)?;

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !table.has_column(column))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::MalformedData(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let record = survey_input_from_row(row)?
                .into_record(Some(row.row_number()), |text| self.classifier.is_human(text))
                .map_err(|err| {
                    warn!(row = row.row_number(), error = %err, "Rejected survey upload");
                    err
                })?;
            records.push(record);
        }

        let sentiment_counts = SentimentCounts::tally(records.iter().map(|r| r.sentiment_label));

        let inserted_count = {
            let _guard = self.replace_lock.lock().await;
            self.store.replace_all(&records).await?
        };

        info!(
            inserted_count,
            positive = sentiment_counts.positive,
            negative = sentiment_counts.negative,
            neutral = sentiment_counts.neutral,
            "Survey upload ingested"
        );

        Ok(IngestSummary {
            inserted_count,
            sentiment_counts,
        })
    }

    /// Append one submission through the same normalization as an upload.
    pub async fn create_survey(&self, input: SurveyInput) -> Result<SurveyRecord> {
        let record = input.into_record(None, |text| self.classifier.is_human(text))?;
        let created = self.store.insert(&record).await?;
        info!(id = created.id, "Survey created");
        Ok(created)
    }
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.trim().to_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(AppError::invalid_parameter("filename", filename, &["*.csv"]))
    }
}

fn text_cell(row: &CsvRow, column: &str) -> String {
    row.get(column).unwrap_or_default().to_string()
}

/// Integers, plus integral decimals such as `4.0` from spreadsheet exports.
fn integer_cell(row: &CsvRow, column: &str) -> Result<i64> {
    let raw = row.get(column).unwrap_or_default().trim();
    INTEGER_CELL_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::MalformedData(format!(
                "row {}: column '{}' expects an integer, got '{}'",
                row.row_number(),
                column,
                raw
            ))
        })
}

fn survey_input_from_row(row: &CsvRow) -> Result<SurveyInput> {
    Ok(SurveyInput {
        age: integer_cell(row, "age")?,
        gender: text_cell(row, "gender"),
        zip_code: text_cell(row, "zip_code"),
        city: text_cell(row, "city"),
        state: text_cell(row, "state"),
        income: text_cell(row, "income"),
        education_level: text_cell(row, "education_level"),
        q1_rating: integer_cell(row, "q1_rating")?,
        q2_rating: integer_cell(row, "q2_rating")?,
        q3_open: text_cell(row, "q3_open"),
        q4_rating: integer_cell(row, "q4_rating")?,
        q5_open: text_cell(row, "q5_open"),
        sentiment_label: text_cell(row, "sentiment_label"),
    })
}
