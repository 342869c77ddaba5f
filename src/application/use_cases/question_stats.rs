use std::sync::Arc;

use crate::domain::error::Result;
use crate::domain::survey_query::{
    GroupBy, OpenTextSummary, QuestionId, QuestionKind, QuestionStats, SurveyFilter,
};
use crate::infrastructure::db::SurveyStore;

pub struct QuestionStatsUseCase {
    store: Arc<dyn SurveyStore>,
}

impl QuestionStatsUseCase {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self { store }
    }

    /// Statistics for one question over the filtered view, optionally grouped
    /// by a demographic dimension. Unknown ids and dimensions are rejected with
    /// the allowed values.
    pub async fn question_stats(
        &self,
        question_id: &str,
        group_by: Option<&str>,
        filter: &SurveyFilter,
    ) -> Result<QuestionStats> {
        let question: QuestionId = question_id.parse()?;
        let group_by = match group_by.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => Some(value.parse::<GroupBy>()?),
            None => None,
        };

        tracing::debug!(
            question = question.column(),
            group_by = group_by.map(|g| g.column()),
            "Computing question stats"
        );

        let stats = match (question.kind(), group_by) {
            (QuestionKind::Rating, None) => {
                QuestionStats::Rating(self.store.rating_summary(question, filter).await?)
            }
            (QuestionKind::Rating, Some(group_by)) => QuestionStats::RatingGroups(
                self.store.rating_groups(question, group_by, filter).await?,
            ),
            (QuestionKind::OpenText, None) => QuestionStats::OpenText(OpenTextSummary {
                responses: self.store.open_text_counts(question, filter).await?,
            }),
            (QuestionKind::OpenText, Some(group_by)) => QuestionStats::OpenTextGroups(
                self.store.open_text_groups(question, group_by, filter).await?,
            ),
        };

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::survey::SentimentLabel;
    use crate::domain::survey_query::GroupKey;
    use crate::infrastructure::db::surveys::tests::{memory_repository, sample_record};

    async fn use_case_with_ratings(ratings: &[i64]) -> QuestionStatsUseCase {
        let store: Arc<dyn SurveyStore> = Arc::new(memory_repository().await);
        let records: Vec<_> = ratings
            .iter()
            .enumerate()
            .map(|(i, rating)| {
                let label = if i % 2 == 0 {
                    SentimentLabel::Positive
                } else {
                    SentimentLabel::Negative
                };
                let mut record = sample_record(*rating, label, "Female");
                record.q3_open = if i % 2 == 0 { "Fast" } else { "Slow" }.to_string();
                record
            })
            .collect();
        store.replace_all(&records).await.unwrap();
        QuestionStatsUseCase::new(store)
    }

    #[tokio::test]
    async fn test_rating_summary_example() {
        let use_case = use_case_with_ratings(&[5, 5, 3, 1]).await;
        let stats = use_case
            .question_stats("q1_rating", None, &SurveyFilter::default())
            .await
            .unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "average": 3.5,
                "min": 1,
                "max": 5,
                "count": 4,
                "distribution": {"1": 1, "2": 0, "3": 1, "4": 0, "5": 2}
            })
        );
    }

    #[tokio::test]
    async fn test_distribution_follows_filter() {
        let use_case = use_case_with_ratings(&[5, 5, 3, 1]).await;
        let filter = SurveyFilter::by_sentiment(SentimentLabel::Negative);
        match use_case.question_stats("q1_rating", None, &filter).await.unwrap() {
            QuestionStats::Rating(summary) => {
                assert_eq!(summary.count, 2);
                assert_eq!(summary.distribution["5"], 1);
                assert_eq!(summary.distribution["1"], 1);
                assert_eq!(summary.distribution["3"], 0);
            }
            other => panic!("unexpected stats: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_grouped_rating_and_open_text() {
        let use_case = use_case_with_ratings(&[5, 5, 3, 1]).await;
        match use_case
            .question_stats("q1_rating", Some("sentiment_label"), &SurveyFilter::default())
            .await
            .unwrap()
        {
            QuestionStats::RatingGroups(groups) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].group, GroupKey::Text("Negative".to_string()));
                assert_eq!(groups[0].average, 3.0);
                assert_eq!(groups[1].average, 4.0);
            }
            other => panic!("unexpected stats: {other:?}"),
        }

        match use_case
            .question_stats("q3_open", None, &SurveyFilter::default())
            .await
            .unwrap()
        {
            QuestionStats::OpenText(summary) => {
                assert_eq!(summary.responses.len(), 2);
                assert_eq!(summary.responses[0].response, "Fast");
                assert_eq!(summary.responses[0].count, 2);
            }
            other => panic!("unexpected stats: {other:?}"),
        }

        match use_case
            .question_stats("q3_open", Some("age"), &SurveyFilter::default())
            .await
            .unwrap()
        {
            QuestionStats::OpenTextGroups(groups) => {
                assert_eq!(groups.len(), 1);
                assert_eq!(groups[0].group, GroupKey::Number(30));
            }
            other => panic!("unexpected stats: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_question_and_group() {
        let use_case = use_case_with_ratings(&[4]).await;
        match use_case
            .question_stats("q9_rating", None, &SurveyFilter::default())
            .await
            .unwrap_err()
        {
            AppError::InvalidParameter { name, allowed, .. } => {
                assert_eq!(name, "question_id");
                assert_eq!(allowed.len(), 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            use_case
                .question_stats("q1_rating", Some("income"), &SurveyFilter::default())
                .await,
            Err(AppError::InvalidParameter { .. })
        ));
    }
}
