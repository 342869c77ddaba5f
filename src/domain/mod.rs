pub mod error;
pub mod survey;
pub mod survey_query;
pub mod us_state;

// Uploaded CSV value objects
pub mod csv;
