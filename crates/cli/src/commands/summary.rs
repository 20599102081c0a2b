use salesight_core::{Bucket, ReportOptions};

use super::{CommandResult, Session};
use crate::QueryArgs;

const COMMAND: &str = "summary";

pub fn run(
    query: &QueryArgs,
    bucket: Option<Bucket>,
    pair: Option<(String, String)>,
) -> CommandResult {
    let session = match Session::open(COMMAND, query) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let mut filter = session.filter.clone();
    if let Some((first, second)) = pair {
        filter = filter.with_category_pair(first, second);
    }
    let options = ReportOptions {
        bucket: bucket.unwrap_or(session.config.analysis.default_bucket),
        heatmap_pairs: session.config.analysis.heatmap_pairs,
    };

    match session.analysis.report(&filter, options) {
        Ok(report) => {
            let message = if report.has_no_sales() {
                "no sales match the selected filters".to_string()
            } else {
                format!(
                    "{} orders, revenue {} across {} states",
                    report.distinct_orders,
                    report.total_revenue,
                    report.orders_by_state.len()
                )
            };
            CommandResult::from_data(COMMAND, message, &report)
        }
        Err(error) => CommandResult::query_failure(COMMAND, &error),
    }
}
