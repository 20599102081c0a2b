use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::NaiveDate;
use salesight_cli::commands::{doctor, matrix, pair, pairs, states, summary, trend};
use salesight_cli::QueryArgs;
use salesight_core::Bucket;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn summary_reports_delivered_sales_only() {
    with_env(&[], || {
        let data = fixture_dir();
        let result = summary::run(&query(data.path()), None, None);
        assert_eq!(result.exit_code, 0, "expected successful summary: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "summary");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "3 orders, revenue 60.75 across 2 states");
        assert_eq!(payload["data"]["distinct_orders"], 3);
        assert_eq!(payload["data"]["sale_records"], 8);
        assert_eq!(payload["data"]["orders_by_state"]["SP"], 2);
        assert_eq!(payload["data"]["orders_by_state"]["RJ"], 1);
        assert_eq!(payload["data"]["top_pairs"][0]["pair"]["first"], "computers");
        assert_eq!(payload["data"]["top_pairs"][0]["pair"]["second"], "toys");
        assert_eq!(payload["data"]["top_pairs"][0]["count"], 2);
        assert_eq!(payload["data"]["raw_top_pairs"][0]["count"], 3);
    });
}

#[test]
fn summary_applies_date_and_state_filters() {
    with_env(&[], || {
        let data = fixture_dir();
        let mut args = query(data.path());
        args.from = NaiveDate::from_ymd_opt(2017, 1, 1);
        args.to = NaiveDate::from_ymd_opt(2017, 1, 31);
        args.state = Some("SP".to_string());

        let result = summary::run(&args, Some(Bucket::Day), None);
        assert_eq!(result.exit_code, 0, "expected successful summary: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["distinct_orders"], 1);
        assert_eq!(payload["data"]["revenue_trend"][0]["bucket"], "2017-01-05");
    });
}

#[test]
fn summary_with_unknown_pair_is_an_invalid_query() {
    with_env(&[], || {
        let data = fixture_dir();
        let pair = Some(("books".to_string(), "spaceships".to_string()));

        let result = summary::run(&query(data.path()), None, pair);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "unknown_category");
    });
}

#[test]
fn states_lists_busiest_state_first() {
    with_env(&[], || {
        let data = fixture_dir();
        let result = states::run(&query(data.path()));
        assert_eq!(result.exit_code, 0, "expected successful states run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"][0]["state"], "SP");
        assert_eq!(payload["data"][0]["orders"], 2);
        assert_eq!(payload["data"][1]["state"], "RJ");
    });
}

#[test]
fn trend_buckets_by_month_by_default() {
    with_env(&[], || {
        let data = fixture_dir();
        let result = trend::run(&query(data.path()), None, false);
        assert_eq!(result.exit_code, 0, "expected successful trend run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["bucket"], "month");
        let points = payload["data"]["points"].as_array().expect("points array");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["bucket"], "2017-01");
        assert_eq!(points[1]["bucket"], "2017-02");
    });
}

#[test]
fn trend_by_state_emits_one_series_per_state() {
    with_env(&[], || {
        let data = fixture_dir();
        let result = trend::run(&query(data.path()), Some(Bucket::Month), true);
        assert_eq!(result.exit_code, 0, "expected successful trend run: {}", result.output);

        let payload = parse_payload(&result.output);
        let series = payload["data"]["series"].as_object().expect("series map");
        assert_eq!(series.len(), 2);
        assert!(series.contains_key("RJ"));
        assert!(series.contains_key("SP"));
    });
}

#[test]
fn pairs_switches_between_dedup_and_raw_counts() {
    with_env(&[], || {
        let data = fixture_dir();

        let dedup = parse_payload(&pairs::run(&query(data.path()), false).output);
        let raw = parse_payload(&pairs::run(&query(data.path()), true).output);

        assert_eq!(dedup["data"]["variant"], "dedup");
        assert_eq!(dedup["data"]["pairs"][0]["count"], 2);
        assert_eq!(dedup["data"]["pairs"].as_array().map(Vec::len), Some(3));
        assert_eq!(raw["data"]["variant"], "raw");
        assert_eq!(raw["data"]["pairs"][0]["count"], 3);
        assert_eq!(dedup["message"], "top pair computers + toys in 2 orders");
        assert_eq!(raw["message"], "top pair computers + toys in 3 item pairs");
    });
}

#[test]
fn pairs_rejects_out_of_range_top() {
    with_env(&[], || {
        let data = fixture_dir();
        let mut args = query(data.path());
        args.top = Some(0);

        let result = pairs::run(&args, false);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_top_n");
    });
}

#[test]
fn pair_distinguishes_zero_from_unknown() {
    with_env(&[], || {
        let data = fixture_dir();

        let known = pair::run(&query(data.path()), "toys", "computers");
        let never_together = pair::run(&query(data.path()), "furniture", "books");
        let unknown = pair::run(&query(data.path()), "books", "spaceships");

        assert_eq!(known.exit_code, 0);
        assert_eq!(parse_payload(&known.output)["data"]["count"], 2);
        assert_eq!(never_together.exit_code, 0);
        assert_eq!(parse_payload(&never_together.output)["data"]["count"], 0);
        assert_eq!(unknown.exit_code, 4);
        assert_eq!(parse_payload(&unknown.output)["error_class"], "unknown_category");
    });
}

#[test]
fn matrix_spans_labels_of_top_pairs() {
    with_env(&[], || {
        let data = fixture_dir();
        let result = matrix::run(&query(data.path()), false, None);
        assert_eq!(result.exit_code, 0, "expected successful matrix run: {}", result.output);

        let payload = parse_payload(&result.output);
        let matrix = &payload["data"]["matrix"];
        assert_eq!(matrix["labels"], serde_json::json!(["books", "computers", "toys"]));
        assert_eq!(matrix["cells"][1][2], 2);
        assert_eq!(matrix["cells"][2][1], 2);
        assert_eq!(matrix["cells"][0][0], 0);
    });
}

#[test]
fn reversed_date_range_is_an_invalid_query() {
    with_env(&[], || {
        let data = fixture_dir();
        let mut args = query(data.path());
        args.from = NaiveDate::from_ymd_opt(2017, 2, 1);
        args.to = NaiveDate::from_ymd_opt(2017, 1, 1);

        let result = states::run(&args);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_range");
    });
}

#[test]
fn missing_data_directory_is_a_data_failure() {
    with_env(&[], || {
        let data = TempDir::new().expect("temp dir");
        let result = states::run(&query(&data.path().join("absent")));
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "states");
        assert_eq!(payload["error_class"], "data_load");
    });
}

#[test]
fn invalid_env_override_is_a_config_failure() {
    with_env(&[("SALESIGHT_ANALYSIS_TOP_N", "many")], || {
        let data = fixture_dir();
        let result = pairs::run(&query(data.path()), false);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_warns_about_rejected_rows() {
    let data = fixture_dir();
    let dir = data.path().display().to_string();
    with_env(&[("SALESIGHT_DATA_DIR", dir.as_str())], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "warnings do not fail doctor: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "warn");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][1]["status"], "pass");
        assert_eq!(payload["checks"][2]["name"], "row_quality");
        assert_eq!(payload["checks"][2]["status"], "warn");
    });
}

#[test]
fn doctor_fails_when_source_files_are_missing() {
    let data = TempDir::new().expect("temp dir");
    let dir = data.path().display().to_string();
    with_env(&[("SALESIGHT_DATA_DIR", dir.as_str())], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 3);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] data_files: missing:"));
        assert!(result.output.contains("- [skip] row_quality"));
    });
}

fn query(data_dir: &Path) -> QueryArgs {
    QueryArgs { data_dir: Some(data_dir.to_path_buf()), ..QueryArgs::default() }
}

fn fixture_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let files = [
        (
            "orders_dataset.csv",
            "order_id,customer_id,order_status,order_purchase_timestamp\n\
             o1,c1,delivered,2017-01-05 09:00:00\n\
             o2,c2,delivered,2017-01-15 12:30:00\n\
             o3,c3,delivered,2017-02-01 08:00:00\n\
             o4,c1,canceled,2017-01-10 10:00:00\n\
             o5,c2,delivered,garbage\n",
        ),
        (
            "order_items_dataset.csv",
            "order_id,order_item_id,product_id,price\n\
             o1,1,pa,10.00\n\
             o1,2,pa,10.00\n\
             o1,3,pb,5.50\n\
             o2,1,pa,20.00\n\
             o2,2,pc,7.25\n\
             o3,1,pb,3.00\n\
             o3,2,pc,4.00\n\
             o3,3,px,1.00\n\
             o4,1,pa,99.00\n\
             o4,2,pb,99.00\n",
        ),
        (
            "customers_dataset.csv",
            "customer_id,customer_unique_id,customer_state\n\
             c1,u1,SP\n\
             c2,u2,RJ\n\
             c3,u3,SP\n",
        ),
        (
            "products_dataset.csv",
            "product_id,product_category_name\n\
             pa,informatica\n\
             pb,brinquedos\n\
             pc,livros\n\
             px,\n",
        ),
        (
            "product_category_name_translation.csv",
            "product_category_name,product_category_name_english\n\
             informatica,computers\n\
             brinquedos,toys\n\
             livros,books\n\
             moveis,furniture\n",
        ),
    ];
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).expect("fixture should be written");
    }
    dir
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SALESIGHT_DATA_DIR",
        "SALESIGHT_DATA_DELIMITER",
        "SALESIGHT_ANALYSIS_TOP_N",
        "SALESIGHT_ANALYSIS_HEATMAP_PAIRS",
        "SALESIGHT_ANALYSIS_BUCKET",
        "SALESIGHT_ANALYSIS_STATUS",
        "SALESIGHT_LOGGING_LEVEL",
        "SALESIGHT_LOGGING_FORMAT",
        "SALESIGHT_LOG_LEVEL",
        "SALESIGHT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
