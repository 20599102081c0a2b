use salesight_core::{revenue_trend, revenue_trend_by_state, Bucket};
use serde_json::json;

use super::{CommandResult, Session};
use crate::QueryArgs;

const COMMAND: &str = "trend";

pub fn run(query: &QueryArgs, bucket: Option<Bucket>, by_state: bool) -> CommandResult {
    let session = match Session::open(COMMAND, query) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let bucket = bucket.unwrap_or(session.config.analysis.default_bucket);
    let sales = session.analysis.sales(&session.filter);

    if by_state {
        let series = revenue_trend_by_state(&sales, bucket);
        let message = format!("{} state series", series.len());
        return CommandResult::success_with_data(
            COMMAND,
            message,
            Some(json!({ "bucket": bucket, "series": series })),
        );
    }

    let points = revenue_trend(&sales, bucket, None);
    let message = match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            format!("{} buckets from {} to {}", points.len(), first.bucket, last.bucket)
        }
        _ => "no sales match the selected filters".to_string(),
    };
    CommandResult::success_with_data(
        COMMAND,
        message,
        Some(json!({ "bucket": bucket, "points": points })),
    )
}
