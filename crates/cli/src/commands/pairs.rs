use salesight_core::BasketVariant;
use serde_json::json;

use super::{CommandResult, Session};
use crate::QueryArgs;

const COMMAND: &str = "pairs";

pub fn run(query: &QueryArgs, raw: bool) -> CommandResult {
    let session = match Session::open(COMMAND, query) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let variant = if raw { BasketVariant::Raw } else { BasketVariant::Dedup };
    match session.analysis.top_pairs(variant, &session.filter) {
        Ok(pairs) => {
            let message = match pairs.first() {
                Some(top) => {
                    let unit = match variant {
                        BasketVariant::Dedup => "orders",
                        BasketVariant::Raw => "item pairs",
                    };
                    format!(
                        "top pair {} + {} in {} {unit}",
                        top.pair.first(),
                        top.pair.second(),
                        top.count
                    )
                }
                None => "no category pairs found".to_string(),
            };
            CommandResult::success_with_data(
                COMMAND,
                message,
                Some(json!({ "variant": variant, "pairs": pairs })),
            )
        }
        Err(error) => CommandResult::query_failure(COMMAND, &error),
    }
}
