pub mod config;
pub mod doctor;
pub mod matrix;
pub mod pair;
pub mod pairs;
pub mod states;
pub mod summary;
pub mod trend;

use std::sync::Arc;

use chrono::NaiveDate;
use salesight_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use salesight_core::{
    normalize, ApplicationError, DateRange, DomainError, FilterConfig, OrderStatus, SalesAnalysis,
    StatusFilter, TableFingerprint,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::loader::load_tables;
use crate::QueryArgs;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATA: u8 = 3;
pub const EXIT_QUERY: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn query_failure(command: &str, error: &DomainError) -> Self {
        let error_class = match error {
            DomainError::InvalidRange { .. } => "invalid_range",
            DomainError::UnknownCategory(_) => "unknown_category",
            DomainError::InvalidTopN(_) => "invalid_top_n",
        };
        Self::failure(command, error_class, error.to_string(), EXIT_QUERY)
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(domain) => Self::query_failure(command, domain),
            ApplicationError::Load(message) => {
                Self::failure(command, "data_load", message.clone(), EXIT_DATA)
            }
            ApplicationError::Configuration(message) => {
                Self::failure(command, "config_validation", message.clone(), EXIT_CONFIG)
            }
        }
    }

    /// Serializes `data` into the success envelope.
    pub fn from_data<T: Serialize>(command: &str, message: impl Into<String>, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::success_with_data(command, message, Some(value)),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loaded tables plus the filters requested on the command line.
pub struct Session {
    pub config: AppConfig,
    pub analysis: SalesAnalysis,
    pub filter: FilterConfig,
}

impl Session {
    pub fn open(command: &str, query: &QueryArgs) -> Result<Self, ApplicationError> {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                data_dir: query.data_dir.clone(),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        let filter = build_filter(&config, query)?;

        let raw = load_tables(&config.data)
            .map_err(|error| ApplicationError::Load(error.to_string()))?;
        let fingerprint = TableFingerprint::of(&raw);
        let normalized = Arc::new(normalize(&raw));
        info!(
            event_name = "cli.session.opened",
            command,
            fingerprint = %fingerprint,
            rejected_rows = normalized.report.rejected.len(),
            "opened analysis session"
        );
        let analysis = SalesAnalysis::new(normalized);

        Ok(Self { config, analysis, filter })
    }
}

pub fn build_filter(config: &AppConfig, query: &QueryArgs) -> Result<FilterConfig, DomainError> {
    let date_range = match (query.from, query.to) {
        (None, None) => None,
        (from, to) => Some(DateRange::from_dates(
            from.unwrap_or(NaiveDate::MIN),
            to.unwrap_or(NaiveDate::MAX),
        )?),
    };

    let filter = FilterConfig {
        status: StatusFilter(OrderStatus::parse(&config.analysis.status)),
        date_range,
        state: query.state.clone(),
        category_pair: None,
        top_n: query.top.unwrap_or(config.analysis.default_top_n),
    };
    filter.validate()?;
    Ok(filter)
}
