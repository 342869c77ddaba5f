use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::error::{AppError, Result};
use super::survey::{SentimentCounts, SentimentLabel, SurveyRecord};

/// Equality predicates over the filterable demographic columns. All present
/// predicates must match; absent ones impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyFilter {
    pub gender: Option<String>,
    pub education_level: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub sentiment_label: Option<SentimentLabel>,
}

/// Raw filter values as they arrive from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub gender: Option<String>,
    pub education_level: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub sentiment: Option<String>,
}

/// Stored text is trimmed at ingestion, so filter values are trimmed the same
/// way before the exact comparison. Blank values mean "no predicate".
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl SurveyFilter {
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        let sentiment_label = match non_empty(params.sentiment.as_deref()) {
            Some(value) => Some(SentimentLabel::parse_param("sentiment", &value)?),
            None => None,
        };

        Ok(Self {
            gender: non_empty(params.gender.as_deref()),
            education_level: non_empty(params.education_level.as_deref()),
            state: non_empty(params.state.as_deref()).map(|state| state.to_ascii_uppercase()),
            city: non_empty(params.city.as_deref()),
            sentiment_label,
        })
    }

    pub fn by_sentiment(label: SentimentLabel) -> Self {
        Self {
            sentiment_label: Some(label),
            ..Self::default()
        }
    }

    /// `(column, value)` pairs for every active predicate, in a fixed order.
    pub fn predicates(&self) -> Vec<(&'static str, String)> {
        let mut predicates = Vec::new();
        if let Some(gender) = &self.gender {
            predicates.push(("gender", gender.clone()));
        }
        if let Some(education_level) = &self.education_level {
            predicates.push(("education_level", education_level.clone()));
        }
        if let Some(state) = &self.state {
            predicates.push(("state", state.clone()));
        }
        if let Some(city) = &self.city {
            predicates.push(("city", city.clone()));
        }
        if let Some(label) = self.sentiment_label {
            predicates.push(("sentiment_label", label.as_str().to_string()));
        }
        predicates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Rating,
    OpenText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionId {
    Q1Rating,
    Q2Rating,
    Q3Open,
    Q4Rating,
    Q5Open,
}

impl QuestionId {
    pub const NAMES: [&'static str; 5] = ["q1_rating", "q2_rating", "q3_open", "q4_rating", "q5_open"];

    /// Column holding the answers to this question.
    pub fn column(&self) -> &'static str {
        match self {
            QuestionId::Q1Rating => "q1_rating",
            QuestionId::Q2Rating => "q2_rating",
            QuestionId::Q3Open => "q3_open",
            QuestionId::Q4Rating => "q4_rating",
            QuestionId::Q5Open => "q5_open",
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionId::Q1Rating | QuestionId::Q2Rating | QuestionId::Q4Rating => {
                QuestionKind::Rating
            }
            QuestionId::Q3Open | QuestionId::Q5Open => QuestionKind::OpenText,
        }
    }
}

impl FromStr for QuestionId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "q1_rating" => Ok(QuestionId::Q1Rating),
            "q2_rating" => Ok(QuestionId::Q2Rating),
            "q3_open" => Ok(QuestionId::Q3Open),
            "q4_rating" => Ok(QuestionId::Q4Rating),
            "q5_open" => Ok(QuestionId::Q5Open),
            other => Err(AppError::invalid_parameter(
                "question_id",
                other,
                &Self::NAMES,
            )),
        }
    }
}

/// Demographic dimension a question can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupBy {
    Gender,
    EducationLevel,
    SentimentLabel,
    Age,
}

impl GroupBy {
    pub const NAMES: [&'static str; 4] = ["gender", "education_level", "sentiment_label", "age"];

    pub fn column(&self) -> &'static str {
        match self {
            GroupBy::Gender => "gender",
            GroupBy::EducationLevel => "education_level",
            GroupBy::SentimentLabel => "sentiment_label",
            GroupBy::Age => "age",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, GroupBy::Age)
    }
}

impl FromStr for GroupBy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "gender" => Ok(GroupBy::Gender),
            "education_level" => Ok(GroupBy::EducationLevel),
            "sentiment_label" => Ok(GroupBy::SentimentLabel),
            "age" => Ok(GroupBy::Age),
            other => Err(AppError::invalid_parameter("group_by", other, &Self::NAMES)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub count: i64,
    pub distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingGroup {
    pub group: GroupKey,
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseCount {
    pub response: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTextSummary {
    pub responses: Vec<ResponseCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTextGroup {
    pub group: GroupKey,
    pub responses: Vec<ResponseCount>,
}

/// Statistics for one question, shaped by question kind and grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuestionStats {
    Rating(RatingSummary),
    RatingGroups(Vec<RatingGroup>),
    OpenText(OpenTextSummary),
    OpenTextGroups(Vec<OpenTextGroup>),
}

/// Rating values "1".."5" mapped to their occurrence counts, zero-filled.
pub fn zero_filled_distribution(counts: &[(i64, i64)]) -> BTreeMap<String, i64> {
    let mut distribution: BTreeMap<String, i64> =
        (1..=5).map(|rating| (rating.to_string(), 0)).collect();
    for (rating, count) in counts {
        if let Some(slot) = distribution.get_mut(&rating.to_string()) {
            *slot += count;
        }
    }
    distribution
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyPage {
    pub items: Vec<SurveyRecord>,
    pub total: i64,
    pub next_cursor: Option<String>,
    pub page_size: i64,
    pub has_more: bool,
    pub sentiment_counts: SentimentCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub inserted_count: u64,
    pub sentiment_counts: SentimentCounts,
}
