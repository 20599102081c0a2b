use salesight_core::orders_by_state;
use serde::Serialize;

use super::{CommandResult, Session};
use crate::QueryArgs;

const COMMAND: &str = "states";

#[derive(Debug, Serialize)]
struct StateRow<'a> {
    state: &'a str,
    orders: usize,
}

pub fn run(query: &QueryArgs) -> CommandResult {
    let session = match Session::open(COMMAND, query) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let counts = orders_by_state(&session.analysis.sales(&session.filter));
    let mut rows: Vec<StateRow<'_>> =
        counts.iter().map(|(state, orders)| StateRow { state, orders: *orders }).collect();
    // Busiest state first; ties keep alphabetical order.
    rows.sort_by(|a, b| b.orders.cmp(&a.orders));

    let message = match rows.first() {
        Some(top) => {
            format!("{} states, busiest {} with {} orders", rows.len(), top.state, top.orders)
        }
        None => "no sales match the selected filters".to_string(),
    };
    CommandResult::from_data(COMMAND, message, &rows)
}
