use std::sync::Arc;

use tracing::debug;

use super::pagination::{PageCursor, PaginationConfig};
use crate::domain::error::{AppError, Result};
use crate::domain::survey::{SentimentLabel, SurveyRecord};
use crate::domain::survey_query::{SurveyFilter, SurveyPage};
use crate::infrastructure::db::SurveyStore;

pub struct SurveyQueryUseCase {
    store: Arc<dyn SurveyStore>,
    pagination: PaginationConfig,
}

impl SurveyQueryUseCase {
    pub fn new(store: Arc<dyn SurveyStore>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    /// One forward-only page of the filtered view, ordered by id.
    ///
    /// Cursors carry the dataset generation. After a full replace they fail
    /// with [`AppError::InvalidCursor`] and the caller has to start over.
    /// Single-record appends keep outstanding cursors valid.
    pub async fn list(
        &self,
        filter: &SurveyFilter,
        cursor: Option<&str>,
        page_size: Option<i64>,
    ) -> Result<SurveyPage> {
        let page_size = self.pagination.resolve_page_size(page_size)?;

        let cursor = match cursor.map(str::trim).filter(|token| !token.is_empty()) {
            Some(token) => Some(PageCursor::decode(token)?),
            None => None,
        };

        let slice = self
            .store
            .page_after(filter, cursor.map(|c| c.last_id), page_size + 1)
            .await?;

        if let Some(cursor) = cursor {
            if cursor.generation != slice.generation {
                return Err(AppError::InvalidCursor(
                    "the dataset was replaced since this cursor was issued; restart from the first page"
                        .to_string(),
                ));
            }
        }

        let generation = slice.generation;
        let total = slice.total;
        let sentiment_counts = slice.sentiment_counts;
        let mut items = slice.items;
        let has_more = items.len() as i64 > page_size;
        if has_more {
            items.truncate(page_size as usize);
        }
        let next_cursor = if has_more {
            items
                .last()
                .map(|record| PageCursor::new(generation, record.id).encode())
        } else {
            None
        };

        debug!(
            returned = items.len(),
            total,
            has_more,
            "Listed survey page"
        );

        Ok(SurveyPage {
            items,
            total,
            next_cursor,
            page_size,
            has_more,
            sentiment_counts,
        })
    }

    pub async fn filter_by_sentiment(&self, label: &str) -> Result<Vec<SurveyRecord>> {
        let label = SentimentLabel::parse_param("sentiment_label", label)?;
        let records = self
            .store
            .list_matching(&SurveyFilter::by_sentiment(label))
            .await?;
        if records.is_empty() {
            return Err(AppError::NotFound(format!(
                "No surveys found with sentiment '{}'",
                label
            )));
        }
        Ok(records)
    }

    /// Every stored record. There is a single survey, so no name is needed.
    pub async fn list_all(&self) -> Result<Vec<SurveyRecord>> {
        let records = self.store.list_matching(&SurveyFilter::default()).await?;
        if records.is_empty() {
            return Err(AppError::NotFound("No surveys found".to_string()));
        }
        Ok(records)
    }
}
