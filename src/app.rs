use std::io;
use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap::bootstrap_state;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{add_log, start_server, LogEntry};

pub async fn run() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    // RUST_LOG wins over the configured filter.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let state = bootstrap_state(&config, &logs)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let server = start_server(&config, state.clone(), logs.clone()).map_err(|err| {
        error!(error = %err, host = %config.host, port = config.port, "Failed to bind HTTP server");
        err
    })?;

    add_log(
        &logs,
        "INFO",
        "HttpApi",
        &format!("Listening on http://{}:{}", config.host, config.port),
    );

    let result = server.await;

    state.repository.close().await;
    info!("Survey database closed");

    result
}
