use salesight_core::config::{AppConfig, LoadOptions};
use salesight_core::{normalize, TableFingerprint};
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIG, EXIT_DATA};
use crate::loader::load_tables;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = exit_code(&report);

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let files = check_data_files(&config);
            let files_present = files.status == CheckStatus::Pass;
            checks.push(files);
            if files_present {
                checks.push(check_row_quality(&config));
            } else {
                checks.push(skipped("row_quality", "skipped because source files are missing"));
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("data_files", "skipped because configuration did not load"));
            checks.push(skipped("row_quality", "skipped because configuration did not load"));
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let (overall_status, summary) = if any_fail {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if all_pass {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    } else {
        (CheckStatus::Warn, "doctor: ready, with warnings")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn skipped(name: &'static str, details: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: details.to_string() }
}

fn check_data_files(config: &AppConfig) -> DoctorCheck {
    let data = &config.data;
    let missing = [
        data.orders_path(),
        data.order_items_path(),
        data.customers_path(),
        data.products_path(),
        data.translations_path(),
    ]
    .into_iter()
    .filter(|path| !path.is_file())
    .map(|path| path.display().to_string())
    .collect::<Vec<_>>();

    if missing.is_empty() {
        DoctorCheck {
            name: "data_files",
            status: CheckStatus::Pass,
            details: format!("all source tables found under `{}`", data.dir.display()),
        }
    } else {
        DoctorCheck {
            name: "data_files",
            status: CheckStatus::Fail,
            details: format!("missing: {}", missing.join(", ")),
        }
    }
}

fn check_row_quality(config: &AppConfig) -> DoctorCheck {
    let raw = match load_tables(&config.data) {
        Ok(raw) => raw,
        Err(error) => {
            return DoctorCheck {
                name: "row_quality",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let fingerprint = TableFingerprint::of(&raw);
    let normalized = normalize(&raw);
    let report = &normalized.report;
    let details = format!(
        "{} orders, {} items loaded ({} malformed timestamps, {} malformed prices, {} categories filled); fingerprint {}",
        normalized.tables.orders.len(),
        normalized.tables.items.len(),
        report.malformed_timestamps(),
        report.malformed_prices(),
        report.categories_filled,
        fingerprint,
    );
    let status = if report.is_clean() { CheckStatus::Pass } else { CheckStatus::Warn };

    DoctorCheck { name: "row_quality", status, details }
}

fn exit_code(report: &DoctorReport) -> u8 {
    let failed = |name: &str| {
        report.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
    };
    if failed("config_validation") {
        EXIT_CONFIG
    } else if failed("data_files") || failed("row_quality") {
        EXIT_DATA
    } else {
        0
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
