use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::error::{AppError, Result};
use super::us_state::normalize_state;

static ZIP_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").unwrap());

/// Maximum length (in characters) of an open-text answer.
pub const MAX_OPEN_TEXT_CHARS: u64 = 1000;

/// Column order of an uploaded survey file. Validation failures are reported
/// for the first failing column in this order.
pub const SURVEY_COLUMNS: [&str; 13] = [
    "age",
    "gender",
    "zip_code",
    "city",
    "state",
    "income",
    "education_level",
    "q1_rating",
    "q2_rating",
    "q3_open",
    "q4_rating",
    "q5_open",
    "sentiment_label",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    pub const NAMES: [&'static str; 3] = ["Positive", "Negative", "Neutral"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }

    /// Parse a query parameter, reporting the allowed labels on failure.
    pub fn parse_param(name: &str, value: &str) -> Result<Self> {
        value
            .parse()
            .map_err(|_| AppError::invalid_parameter(name, value, &Self::NAMES))
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown sentiment label '{}'", trimmed))
    }
}

/// Occurrence counts keyed by sentiment label, zero-filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    #[serde(rename = "Positive")]
    pub positive: i64,
    #[serde(rename = "Negative")]
    pub negative: i64,
    #[serde(rename = "Neutral")]
    pub neutral: i64,
}

impl SentimentCounts {
    pub fn tally<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = SentimentLabel>,
    {
        let mut counts = Self::default();
        for label in labels {
            counts.add(label, 1);
        }
        counts
    }

    pub fn add(&mut self, label: SentimentLabel, count: i64) {
        match label {
            SentimentLabel::Positive => self.positive += count,
            SentimentLabel::Negative => self.negative += count,
            SentimentLabel::Neutral => self.neutral += count,
        }
    }

    pub fn get(&self, label: SentimentLabel) -> i64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> i64 {
        self.positive + self.negative + self.neutral
    }
}

/// A stored survey submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub id: i64,
    pub age: i64,
    pub gender: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub income: String,
    pub education_level: String,
    pub q1_rating: i64,
    pub q2_rating: i64,
    pub q3_open: String,
    pub q4_rating: i64,
    pub q5_open: String,
    pub sentiment_label: SentimentLabel,
    pub is_human: bool,
}

/// A validated submission waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSurveyRecord {
    pub age: i64,
    pub gender: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub income: String,
    pub education_level: String,
    pub q1_rating: i64,
    pub q2_rating: i64,
    pub q3_open: String,
    pub q4_rating: i64,
    pub q5_open: String,
    pub sentiment_label: SentimentLabel,
    pub is_human: bool,
}

impl NewSurveyRecord {
    pub fn with_id(self, id: i64) -> SurveyRecord {
        SurveyRecord {
            id,
            age: self.age,
            gender: self.gender,
            zip_code: self.zip_code,
            city: self.city,
            state: self.state,
            income: self.income,
            education_level: self.education_level,
            q1_rating: self.q1_rating,
            q2_rating: self.q2_rating,
            q3_open: self.q3_open,
            q4_rating: self.q4_rating,
            q5_open: self.q5_open,
            sentiment_label: self.sentiment_label,
            is_human: self.is_human,
        }
    }
}

/// Typed but not yet validated submission, either coerced from a CSV row
/// or deserialized from a single-record request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SurveyInput {
    #[validate(range(min = 0, max = 120))]
    pub age: i64,
    pub gender: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub income: String,
    pub education_level: String,
    #[validate(range(min = 1, max = 5))]
    pub q1_rating: i64,
    #[validate(range(min = 1, max = 5))]
    pub q2_rating: i64,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub q3_open: String,
    #[validate(range(min = 1, max = 5))]
    pub q4_rating: i64,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub q5_open: String,
    pub sentiment_label: String,
}

impl SurveyInput {
    /// Open-text answer used for the human/non-human signal: `q5_open` when
    /// present, otherwise `q3_open`.
    pub fn classification_text(&self) -> &str {
        let q5 = self.q5_open.trim();
        if q5.is_empty() {
            self.q3_open.trim()
        } else {
            q5
        }
    }

    /// Normalize and validate into a storable record.
    ///
    /// `row` is the 1-based data row of an upload, `None` for single-record creation.
    pub fn into_record<F>(self, row: Option<usize>, classify: F) -> Result<NewSurveyRecord>
    where
        F: Fn(&str) -> bool,
    {
        let state = normalize_state(&self.state).ok_or_else(|| AppError::InvalidState {
            row,
            value: self.state.trim().to_string(),
        })?;

        let mut failed: Vec<String> = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect(),
        };

        let zip_code = self.zip_code.trim().to_string();
        if !ZIP_CODE_PATTERN.is_match(&zip_code) {
            failed.push("zip_code".to_string());
        }

        let sentiment = self.sentiment_label.parse::<SentimentLabel>();
        if sentiment.is_err() {
            failed.push("sentiment_label".to_string());
        }

        if let Some(field) = failed
            .iter()
            .min_by_key(|field| column_position(field.as_str()))
        {
            return Err(AppError::validation(
                row,
                field,
                self.describe_failure(field),
            ));
        }

        let sentiment_label = sentiment.map_err(|err| AppError::validation(row, "sentiment_label", err))?;
        let is_human = classify(self.classification_text());

        Ok(NewSurveyRecord {
            age: self.age,
            gender: self.gender.trim().to_string(),
            zip_code,
            city: self.city.trim().to_string(),
            state,
            income: self.income.trim().to_string(),
            education_level: self.education_level.trim().to_string(),
            q1_rating: self.q1_rating,
            q2_rating: self.q2_rating,
            q3_open: self.q3_open.trim().to_string(),
            q4_rating: self.q4_rating,
            q5_open: self.q5_open.trim().to_string(),
            sentiment_label,
            is_human,
        })
    }

    fn describe_failure(&self, field: &str) -> String {
        match field {
            "age" => format!("{} is outside 0..=120", self.age),
            "q1_rating" => format!("{} is outside 1..=5", self.q1_rating),
            "q2_rating" => format!("{} is outside 1..=5", self.q2_rating),
            "q4_rating" => format!("{} is outside 1..=5", self.q4_rating),
            "q3_open" | "q5_open" => {
                format!("longer than {} characters", MAX_OPEN_TEXT_CHARS)
            }
            "zip_code" => format!(
                "'{}' does not match 12345 or 12345-6789",
                self.zip_code.trim()
            ),
            "sentiment_label" => format!(
                "'{}' is not one of {:?}",
                self.sentiment_label.trim(),
                SentimentLabel::NAMES
            ),
            other => format!("invalid value for {}", other),
        }
    }
}

fn column_position(field: &str) -> usize {
    SURVEY_COLUMNS
        .iter()
        .position(|column| *column == field)
        .unwrap_or(SURVEY_COLUMNS.len())
}
