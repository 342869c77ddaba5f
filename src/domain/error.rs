use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError {
        row: Option<usize>,
        field: String,
        message: String,
    },
    InvalidState {
        row: Option<usize>,
        value: String,
    },
    MalformedData(String),
    InvalidParameter {
        name: String,
        value: String,
        allowed: Vec<String>,
    },
    InvalidCursor(String),
    DatabaseError(String),
    IoError(String),
}

impl AppError {
    pub fn validation(row: Option<usize>, field: &str, message: impl Into<String>) -> Self {
        AppError::ValidationError {
            row,
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_parameter(name: &str, value: &str, allowed: &[&str]) -> Self {
        AppError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            allowed: allowed.iter().map(|item| item.to_string()).collect(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::ValidationError { .. } => "validation_error",
            AppError::InvalidState { .. } => "invalid_state",
            AppError::MalformedData(_) => "malformed_data",
            AppError::InvalidParameter { .. } => "invalid_parameter",
            AppError::InvalidCursor(_) => "invalid_cursor",
            AppError::DatabaseError(_) => "database_error",
            AppError::IoError(_) => "io_error",
        }
    }
}

fn row_prefix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!("row {}: ", row),
        None => String::new(),
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError {
                row,
                field,
                message,
            } => write!(
                f,
                "Validation error: {}field '{}': {}",
                row_prefix(row),
                field,
                message
            ),
            AppError::InvalidState { row, value } => write!(
                f,
                "Invalid state: {}'{}' is not a recognized US state or territory code",
                row_prefix(row),
                value
            ),
            AppError::MalformedData(msg) => write!(f, "Malformed data: {}", msg),
            AppError::InvalidParameter {
                name,
                value,
                allowed,
            } => write!(
                f,
                "Invalid {} '{}'. Must be one of {:?}",
                name, value, allowed
            ),
            AppError::InvalidCursor(msg) => write!(f, "Invalid cursor: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_row_and_field() {
        let err = AppError::validation(Some(3), "q1_rating", "must be between 1 and 5");
        assert_eq!(
            err.to_string(),
            "Validation error: row 3: field 'q1_rating': must be between 1 and 5"
        );
    }

    #[test]
    fn test_invalid_parameter_lists_allowed_values() {
        let err = AppError::invalid_parameter("group_by", "city", &["gender", "age"]);
        let message = err.to_string();
        assert!(message.contains("group_by"));
        assert!(message.contains("\"gender\""));
        assert!(message.contains("\"age\""));
        assert_eq!(err.kind(), "invalid_parameter");
    }
}
