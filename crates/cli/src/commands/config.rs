use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use salesight_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// Keys in display order with the env vars that can set them.
const FIELDS: &[(&str, &[&str])] = &[
    ("data.dir", &["SALESIGHT_DATA_DIR"]),
    ("data.orders_file", &[]),
    ("data.order_items_file", &[]),
    ("data.customers_file", &[]),
    ("data.products_file", &[]),
    ("data.translations_file", &[]),
    ("data.delimiter", &["SALESIGHT_DATA_DELIMITER"]),
    ("analysis.default_top_n", &["SALESIGHT_ANALYSIS_TOP_N"]),
    ("analysis.heatmap_pairs", &["SALESIGHT_ANALYSIS_HEATMAP_PAIRS"]),
    ("analysis.default_bucket", &["SALESIGHT_ANALYSIS_BUCKET"]),
    ("analysis.status", &["SALESIGHT_ANALYSIS_STATUS"]),
    ("logging.level", &["SALESIGHT_LOGGING_LEVEL", "SALESIGHT_LOG_LEVEL"]),
    ("logging.format", &["SALESIGHT_LOGGING_FORMAT", "SALESIGHT_LOG_FORMAT"]),
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys) in FIELDS {
        lines.push(render_line(
            key_path,
            &field_value(&config, key_path),
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    lines.join("\n")
}

fn field_value(config: &AppConfig, key_path: &str) -> String {
    match key_path {
        "data.dir" => config.data.dir.display().to_string(),
        "data.orders_file" => config.data.orders_file.clone(),
        "data.order_items_file" => config.data.order_items_file.clone(),
        "data.customers_file" => config.data.customers_file.clone(),
        "data.products_file" => config.data.products_file.clone(),
        "data.translations_file" => config.data.translations_file.clone(),
        "data.delimiter" => format!("{:?}", config.data.delimiter),
        "analysis.default_top_n" => config.analysis.default_top_n.to_string(),
        "analysis.heatmap_pairs" => config.analysis.heatmap_pairs.to_string(),
        "analysis.default_bucket" => format!("{:?}", config.analysis.default_bucket),
        "analysis.status" => config.analysis.status.clone(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        _ => "<unknown>".to_string(),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("salesight.toml"), PathBuf::from("config/salesight.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
