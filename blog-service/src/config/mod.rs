use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct BlogConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub couchdb: CouchConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    CouchDb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CouchConfig {
    pub url: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    /// PEM bundle of extra trust roots for the database's TLS certificate.
    /// Certificates are always verified; this only widens what is trusted.
    pub ca_cert_path: Option<String>,
    pub create_database: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl BlogConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(BlogConfig {
            common: common_config,
            store: StoreConfig {
                backend: get_env("STORE_BACKEND", Some("couchdb"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            couchdb: CouchConfig {
                url: get_env("COUCHDB_URL", Some("http://localhost:5984"), is_prod)?,
                database: get_env("COUCHDB_DATABASE", Some("posts"), is_prod)?,
                username: env::var("COUCHDB_USERNAME").ok(),
                password: env::var("COUCHDB_PASSWORD").ok().map(Secret::new),
                ca_cert_path: env::var("COUCHDB_CA_CERT").ok(),
                create_database: parse_bool(
                    "COUCHDB_CREATE_DATABASE",
                    &env::var("COUCHDB_CREATE_DATABASE")
                        .unwrap_or_else(|_| (!is_prod).to_string()),
                )?,
            },
            observability: ObservabilityConfig::from_env(),
        })
    }
}

impl ObservabilityConfig {
    /// Read logging settings straight from the environment so tracing can be
    /// installed before the rest of the configuration is loaded.
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "couchdb" | "couch" => Ok(StoreBackend::CouchDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a boolean, got '{}'",
            key,
            value
        ))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
