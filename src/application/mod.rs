pub mod use_cases;

pub use use_cases::pagination::{PageCursor, PaginationConfig};
pub use use_cases::question_stats::QuestionStatsUseCase;
pub use use_cases::survey_ingestion::SurveyIngestionUseCase;
pub use use_cases::survey_query::SurveyQueryUseCase;
