pub mod connection;
pub mod surveys;

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::survey::{NewSurveyRecord, SentimentCounts, SurveyRecord};
use crate::domain::survey_query::{
    GroupBy, OpenTextGroup, QuestionId, RatingGroup, RatingSummary, ResponseCount, SurveyFilter,
};

pub use surveys::SurveyRepository;

/// One page of the filtered view with its totals, read from a single snapshot.
#[derive(Debug, Clone)]
pub struct PageSlice {
    /// Dataset generation the page was read under.
    pub generation: i64,
    pub items: Vec<SurveyRecord>,
    pub total: i64,
    pub sentiment_counts: SentimentCounts,
}

/// Persistence seam for the single survey table.
///
/// Every read takes the caller's [`SurveyFilter`] so pagination and the
/// aggregations always see the same filtered view.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Delete every record and insert `records` as one atomic unit, bumping
    /// the dataset generation. Returns the number of inserted rows.
    async fn replace_all(&self, records: &[NewSurveyRecord]) -> Result<u64>;

    /// Append a single record at the tail.
    async fn insert(&self, record: &NewSurveyRecord) -> Result<SurveyRecord>;

    /// Up to `limit` matching records with `id > after_id`, ascending by id,
    /// together with the generation, total and sentiment tally of the same view.
    async fn page_after(
        &self,
        filter: &SurveyFilter,
        after_id: Option<i64>,
        limit: i64,
    ) -> Result<PageSlice>;

    async fn list_matching(&self, filter: &SurveyFilter) -> Result<Vec<SurveyRecord>>;

    async fn count(&self, filter: &SurveyFilter) -> Result<i64>;

    async fn sentiment_counts(&self, filter: &SurveyFilter) -> Result<SentimentCounts>;

    /// Incremented by every [`SurveyStore::replace_all`].
    async fn generation(&self) -> Result<i64>;

    async fn rating_summary(
        &self,
        question: QuestionId,
        filter: &SurveyFilter,
    ) -> Result<RatingSummary>;

    async fn rating_groups(
        &self,
        question: QuestionId,
        group_by: GroupBy,
        filter: &SurveyFilter,
    ) -> Result<Vec<RatingGroup>>;

    async fn open_text_counts(
        &self,
        question: QuestionId,
        filter: &SurveyFilter,
    ) -> Result<Vec<ResponseCount>>;

    async fn open_text_groups(
        &self,
        question: QuestionId,
        group_by: GroupBy,
        filter: &SurveyFilter,
    ) -> Result<Vec<OpenTextGroup>>;
}
