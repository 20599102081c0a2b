use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::Bucket;
use crate::filter::MAX_TOP_N;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// Where the source tables live. File names are relative to `dir`.
#[derive(Clone, Debug)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub orders_file: String,
    pub order_items_file: String,
    pub customers_file: String,
    pub products_file: String,
    pub translations_file: String,
    pub delimiter: char,
}

#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    pub default_top_n: usize,
    pub heatmap_pairs: usize,
    pub default_bucket: Bucket,
    pub status: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dir: PathBuf::from("data"),
                orders_file: "orders_dataset.csv".to_string(),
                order_items_file: "order_items_dataset.csv".to_string(),
                customers_file: "customers_dataset.csv".to_string(),
                products_file: "products_dataset.csv".to_string(),
                translations_file: "product_category_name_translation.csv".to_string(),
                delimiter: ',',
            },
            analysis: AnalysisConfig {
                default_top_n: 10,
                heatmap_pairs: 20,
                default_bucket: Bucket::Month,
                status: "delivered".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl DataConfig {
    pub fn orders_path(&self) -> PathBuf {
        self.dir.join(&self.orders_file)
    }

    pub fn order_items_path(&self) -> PathBuf {
        self.dir.join(&self.order_items_file)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.dir.join(&self.customers_file)
    }

    pub fn products_path(&self) -> PathBuf {
        self.dir.join(&self.products_file)
    }

    pub fn translations_path(&self) -> PathBuf {
        self.dir.join(&self.translations_file)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("salesight.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(data) = patch.data {
            if let Some(dir) = data.dir {
                self.data.dir = dir;
            }
            if let Some(orders_file) = data.orders_file {
                self.data.orders_file = orders_file;
            }
            if let Some(order_items_file) = data.order_items_file {
                self.data.order_items_file = order_items_file;
            }
            if let Some(customers_file) = data.customers_file {
                self.data.customers_file = customers_file;
            }
            if let Some(products_file) = data.products_file {
                self.data.products_file = products_file;
            }
            if let Some(translations_file) = data.translations_file {
                self.data.translations_file = translations_file;
            }
            if let Some(delimiter) = data.delimiter {
                self.data.delimiter = delimiter;
            }
        }

        if let Some(analysis) = patch.analysis {
            if let Some(default_top_n) = analysis.default_top_n {
                self.analysis.default_top_n = default_top_n;
            }
            if let Some(heatmap_pairs) = analysis.heatmap_pairs {
                self.analysis.heatmap_pairs = heatmap_pairs;
            }
            if let Some(default_bucket) = analysis.default_bucket {
                self.analysis.default_bucket = default_bucket;
            }
            if let Some(status) = analysis.status {
                self.analysis.status = status;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SALESIGHT_DATA_DIR") {
            self.data.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SALESIGHT_DATA_DELIMITER") {
            self.data.delimiter = parse_char("SALESIGHT_DATA_DELIMITER", &value)?;
        }

        if let Some(value) = read_env("SALESIGHT_ANALYSIS_TOP_N") {
            self.analysis.default_top_n = parse_usize("SALESIGHT_ANALYSIS_TOP_N", &value)?;
        }
        if let Some(value) = read_env("SALESIGHT_ANALYSIS_HEATMAP_PAIRS") {
            self.analysis.heatmap_pairs = parse_usize("SALESIGHT_ANALYSIS_HEATMAP_PAIRS", &value)?;
        }
        if let Some(value) = read_env("SALESIGHT_ANALYSIS_BUCKET") {
            self.analysis.default_bucket =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "SALESIGHT_ANALYSIS_BUCKET".to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read_env("SALESIGHT_ANALYSIS_STATUS") {
            self.analysis.status = value;
        }

        let log_level =
            read_env("SALESIGHT_LOGGING_LEVEL").or_else(|| read_env("SALESIGHT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SALESIGHT_LOGGING_FORMAT").or_else(|| read_env("SALESIGHT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.data.dir = data_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_data(&self.data)?;
        validate_analysis(&self.analysis)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("salesight.toml"), PathBuf::from("config/salesight.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if data.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("data.dir must not be empty".to_string()));
    }

    let files = [
        ("data.orders_file", &data.orders_file),
        ("data.order_items_file", &data.order_items_file),
        ("data.customers_file", &data.customers_file),
        ("data.products_file", &data.products_file),
        ("data.translations_file", &data.translations_file),
    ];
    for (key, value) in files {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    if !data.delimiter.is_ascii() || data.delimiter.is_ascii_alphanumeric() {
        return Err(ConfigError::Validation(
            "data.delimiter must be a single ASCII punctuation or whitespace character"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.default_top_n == 0 || analysis.default_top_n > MAX_TOP_N {
        return Err(ConfigError::Validation(format!(
            "analysis.default_top_n must be in range 1..={MAX_TOP_N}"
        )));
    }

    if analysis.heatmap_pairs == 0 || analysis.heatmap_pairs > MAX_TOP_N {
        return Err(ConfigError::Validation(format!(
            "analysis.heatmap_pairs must be in range 1..={MAX_TOP_N}"
        )));
    }

    if analysis.status.trim().is_empty() {
        return Err(ConfigError::Validation("analysis.status must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_char(key: &str, value: &str) -> Result<char, ConfigError> {
    let value = if value == "\\t" { "\t" } else { value };
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    data: Option<DataPatch>,
    analysis: Option<AnalysisPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    dir: Option<PathBuf>,
    orders_file: Option<String>,
    order_items_file: Option<String>,
    customers_file: Option<String>,
    products_file: Option<String>,
    translations_file: Option<String>,
    delimiter: Option<char>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    default_top_n: Option<usize>,
    heatmap_pairs: Option<usize>,
    default_bucket: Option<Bucket>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
