use crate::domain::error::AppError;
use crate::domain::survey::SurveyInput;
use crate::domain::survey_query::{FilterParams, SurveyFilter};
use crate::infrastructure::config::AppConfig;
use crate::interfaces::AppState;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{
    dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, ResponseError,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. }
            | AppError::InvalidState { .. }
            | AppError::MalformedData(_)
            | AppError::InvalidParameter { .. }
            | AppError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::DatabaseError(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "detail": self.to_string(),
            "error": self.kind(),
        });
        match self {
            AppError::InvalidParameter { allowed, .. } => body["allowed"] = json!(allowed),
            AppError::ValidationError { row, field, .. } => {
                body["field"] = json!(field);
                if let Some(row) = row {
                    body["row"] = json!(row);
                }
            }
            AppError::InvalidState { row: Some(row), .. } => body["row"] = json!(row),
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SurveyListQuery {
    pub cursor: Option<String>,
    /// Parsed by hand so a bad value reports the allowed range
    pub page_size: Option<String>,
    #[serde(flatten)]
    pub filters: FilterParams,
}

impl SurveyListQuery {
    fn page_size(&self) -> Result<Option<i64>, AppError> {
        match self.page_size.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| AppError::InvalidParameter {
                name: "page_size".to_string(),
                value: raw.to_string(),
                allowed: vec!["a positive integer".to_string()],
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub group_by: Option<String>,
    #[serde(flatten)]
    pub filters: FilterParams,
}

/// Record a failed request in the log buffer and hand the error back.
fn log_failure(logs: &Mutex<Vec<LogEntry>>, action: &str, err: AppError) -> AppError {
    let level = if err.status_code().is_server_error() {
        "ERROR"
    } else {
        "WARN"
    };
    add_log(logs, level, "HttpApi", &format!("{} failed: {}", action, err));
    err
}

#[get("/")]
async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Welcome to Survey Data API" }))
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Uploading survey file {} ({} bytes)",
            query.filename.as_deref().unwrap_or("<unnamed>"),
            body.len()
        ),
    );

    let summary = data
        .app_state
        .ingestion_use_case
        .ingest(&body, query.filename.as_deref())
        .await
        .map_err(|err| log_failure(&data.logs, "Upload", err))?;

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Ingested {} surveys", summary.inserted_count),
    );
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/surveys")]
async fn list_surveys(
    data: web::Data<HttpState>,
    query: web::Query<SurveyListQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = SurveyFilter::from_params(&query.filters)?;
    let page = data
        .app_state
        .query_use_case
        .list(&filter, query.cursor.as_deref(), query.page_size()?)
        .await
        .map_err(|err| log_failure(&data.logs, "Listing surveys", err))?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/surveys")]
async fn create_survey(
    data: web::Data<HttpState>,
    input: web::Json<SurveyInput>,
) -> Result<HttpResponse, AppError> {
    let created = data
        .app_state
        .ingestion_use_case
        .create_survey(input.into_inner())
        .await
        .map_err(|err| log_failure(&data.logs, "Creating survey", err))?;

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Created survey {}", created.id),
    );
    Ok(HttpResponse::Created().json(created))
}

#[get("/surveys/sentiment/{label}")]
async fn surveys_by_sentiment(
    data: web::Data<HttpState>,
    label: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let records = data
        .app_state
        .query_use_case
        .filter_by_sentiment(&label)
        .await
        .map_err(|err| log_failure(&data.logs, "Sentiment filter", err))?;
    Ok(HttpResponse::Ok().json(records))
}

/// Single-survey dataset: the name only selects the route.
#[get("/surveys/{survey_name}")]
async fn get_survey(
    data: web::Data<HttpState>,
    _survey_name: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let records = data
        .app_state
        .query_use_case
        .list_all()
        .await
        .map_err(|err| log_failure(&data.logs, "Loading survey", err))?;
    Ok(HttpResponse::Ok().json(records))
}

#[get("/questions/{question_id}")]
async fn question_stats(
    data: web::Data<HttpState>,
    question_id: web::Path<String>,
    query: web::Query<QuestionQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = SurveyFilter::from_params(&query.filters)?;
    let stats = data
        .app_state
        .question_stats_use_case
        .question_stats(&question_id, query.group_by.as_deref(), &filter)
        .await
        .map_err(|err| log_failure(&data.logs, "Question stats", err))?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = match data.logs.lock() {
        Ok(logs) => logs,
        Err(poisoned) => poisoned.into_inner(),
    };
    HttpResponse::Ok().json(&*logs)
}

/// Routes plus extractor error mapping, shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::MalformedData(format!("Invalid JSON body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::MalformedData(format!("Invalid query string: {}", err)).into()
    }))
    .service(root)
    .service(upload)
    .service(list_surveys)
    .service(create_survey)
    .service(surveys_by_sentiment)
    .service(get_survey)
    .service(question_stats)
    .service(get_logs);
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        "DEBUG" => tracing::debug!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = match logs.lock() {
        Ok(logs) => logs,
        Err(poisoned) => poisoned.into_inner(),
    };
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}

pub fn start_server(
    config: &AppConfig,
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app_state, logs });
    let allowed_origins = config.cors_allowed_origins.clone();
    let max_upload_bytes = config.max_upload_bytes;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&allowed_origins))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .configure(configure)
    })
    .bind(config.bind_address())?
    .run();

    Ok(server)
}
