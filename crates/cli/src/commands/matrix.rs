use salesight_core::{BasketVariant, DomainError, MAX_TOP_N};
use serde_json::json;

use super::{CommandResult, Session};
use crate::QueryArgs;

const COMMAND: &str = "matrix";

pub fn run(query: &QueryArgs, raw: bool, pairs: Option<usize>) -> CommandResult {
    let session = match Session::open(COMMAND, query) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let heatmap_pairs = pairs.unwrap_or(session.config.analysis.heatmap_pairs);
    if heatmap_pairs == 0 || heatmap_pairs > MAX_TOP_N {
        return CommandResult::query_failure(COMMAND, &DomainError::InvalidTopN(heatmap_pairs));
    }

    let variant = if raw { BasketVariant::Raw } else { BasketVariant::Dedup };
    let matrix = session.analysis.heatmap(variant, heatmap_pairs);
    let message = if matrix.is_empty() {
        "no category pairs found".to_string()
    } else {
        format!("{0}x{0} matrix over the top {heatmap_pairs} pairs", matrix.labels().len())
    };
    CommandResult::success_with_data(
        COMMAND,
        message,
        Some(json!({ "variant": variant, "matrix": matrix })),
    )
}
