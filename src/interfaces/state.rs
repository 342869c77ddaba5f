use std::sync::Arc;

use crate::application::use_cases::pagination::PaginationConfig;
use crate::application::use_cases::question_stats::QuestionStatsUseCase;
use crate::application::use_cases::survey_ingestion::SurveyIngestionUseCase;
use crate::application::use_cases::survey_query::SurveyQueryUseCase;
use crate::infrastructure::db::{SurveyRepository, SurveyStore};

pub struct AppState {
    pub ingestion_use_case: SurveyIngestionUseCase,
    pub query_use_case: SurveyQueryUseCase,
    pub question_stats_use_case: QuestionStatsUseCase,
    /// Kept so the pool can be closed on shutdown
    pub repository: Arc<SurveyRepository>,
}

impl AppState {
    pub fn new(repository: Arc<SurveyRepository>, pagination: PaginationConfig) -> Self {
        let store: Arc<dyn SurveyStore> = repository.clone();
        Self {
            ingestion_use_case: SurveyIngestionUseCase::new(store.clone()),
            query_use_case: SurveyQueryUseCase::new(store.clone(), pagination),
            question_stats_use_case: QuestionStatsUseCase::new(store),
            repository,
        }
    }
}
