use std::sync::{Arc, Mutex};

use tracing::error;

use crate::application::use_cases::pagination::PaginationConfig;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::SurveyRepository;
use crate::interfaces::http::{add_log, LogEntry};
use crate::interfaces::AppState;

/// Open the survey store named by `config` and wire every use case onto it.
pub async fn bootstrap_state(
    config: &AppConfig,
    logs: &Arc<Mutex<Vec<LogEntry>>>,
) -> Result<Arc<AppState>> {
    let repository = SurveyRepository::connect(&config.database_url, config.max_connections)
        .await
        .map_err(|err| {
            error!(
                error = %err,
                database_url = %config.database_url,
                "Failed to initialize survey database"
            );
            add_log(
                logs,
                "ERROR",
                "Bootstrap",
                &format!("Failed to initialize survey database: {}", err),
            );
            err
        })?;

    let pagination = PaginationConfig {
        default_page_size: config.default_page_size,
        max_page_size: config.max_page_size,
    };
    let state = AppState::new(Arc::new(repository), pagination);

    add_log(
        logs,
        "INFO",
        "Bootstrap",
        &format!("Survey database ready at {}", config.database_url),
    );

    Ok(Arc::new(state))
}
