pub mod pagination;
pub mod question_stats;
pub mod survey_ingestion;
pub mod survey_query;
