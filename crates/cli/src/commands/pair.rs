use salesight_core::PairQuery;

use super::{CommandResult, Session};
use crate::QueryArgs;

const COMMAND: &str = "pair";

pub fn run(query: &QueryArgs, first: &str, second: &str) -> CommandResult {
    let session = match Session::open(COMMAND, query) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    match session.analysis.pair_count_for(first, second) {
        Ok(count) => {
            let result =
                PairQuery { first: first.to_string(), second: second.to_string(), count };
            let message = format!("{first} + {second} bought together in {count} orders");
            CommandResult::from_data(COMMAND, message, &result)
        }
        Err(error) => CommandResult::query_failure(COMMAND, &error),
    }
}
