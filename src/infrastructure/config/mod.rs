use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// Environment variable naming an alternative TOML config file.
pub const CONFIG_PATH_ENV: &str = "SURVEY_API_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "survey-api.toml";
const ENV_PREFIX: &str = "SURVEY_API_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub max_upload_bytes: usize,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub log_filter: String,
    /// Empty means permissive CORS.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://survey_data.db".to_string(),
            max_connections: 4,
            max_upload_bytes: 10 * 1024 * 1024,
            default_page_size: 50,
            max_page_size: 100,
            log_filter: "info".to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `SURVEY_API_*` environment variables.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_figment(Self::figment(&path))
    }

    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(AppError::Internal(
                "Invalid configuration: port must be non-zero".to_string(),
            ));
        }
        if self.max_page_size < 1 {
            return Err(AppError::Internal(format!(
                "Invalid configuration: max_page_size must be at least 1, got {}",
                self.max_page_size
            )));
        }
        if self.default_page_size < 1 || self.default_page_size > self.max_page_size {
            return Err(AppError::Internal(format!(
                "Invalid configuration: default_page_size {} must be within 1..={}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::from_figment(with_toml("")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 8000));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = AppConfig::from_figment(with_toml(
            "port = 9100\ndatabase_url = \"sqlite::memory:\"\ncors_allowed_origins = [\"http://localhost:3000\"]",
        ))
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn test_validate_rejects_page_size_policy() {
        assert!(AppConfig::from_figment(with_toml("default_page_size = 0")).is_err());
        assert!(AppConfig::from_figment(with_toml("default_page_size = 200")).is_err());
        assert!(AppConfig::from_figment(with_toml("max_page_size = 0")).is_err());
        assert!(AppConfig::from_figment(with_toml("port = 0")).is_err());
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let err = AppConfig::from_figment(with_toml("port = \"eighty\"")).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
