//! Geographic and time-bucketed sales aggregates.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::order::OrderId;
use crate::domain::sale::SaleRecord;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Day,
    #[default]
    Month,
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(format!("unsupported bucket `{other}` (expected day|month)")),
        }
    }
}

/// Start date of a bucket. Months are keyed by their first day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    start: NaiveDate,
    bucket: Bucket,
}

impl BucketKey {
    pub fn truncate(date: NaiveDate, bucket: Bucket) -> Self {
        let start = match bucket {
            Bucket::Day => date,
            Bucket::Month => date.with_day(1).unwrap_or(date),
        };
        Self { start, bucket }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bucket {
            Bucket::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Bucket::Month => write!(f, "{}", self.start.format("%Y-%m")),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub bucket: BucketKey,
    pub revenue: Decimal,
}

/// Distinct orders per customer state. An order with several items counts
/// once.
pub fn orders_by_state(sales: &[SaleRecord]) -> BTreeMap<String, usize> {
    let mut orders: BTreeMap<&str, HashSet<&OrderId>> = BTreeMap::new();
    for sale in sales {
        orders.entry(sale.state.as_str()).or_default().insert(&sale.order_id);
    }
    orders.into_iter().map(|(state, ids)| (state.to_string(), ids.len())).collect()
}

/// Sorted distinct states present in `sales`.
pub fn states(sales: &[SaleRecord]) -> Vec<String> {
    sales
        .iter()
        .map(|sale| sale.state.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Revenue per bucket, ascending. `state` narrows to one customer state.
pub fn revenue_trend(
    sales: &[SaleRecord],
    bucket: Bucket,
    state: Option<&str>,
) -> Vec<TrendPoint> {
    bucket_revenue(
        sales.iter().filter(|sale| state.map_or(true, |state| sale.state == state)),
        bucket,
    )
}

/// One revenue series per state.
pub fn revenue_trend_by_state(
    sales: &[SaleRecord],
    bucket: Bucket,
) -> BTreeMap<String, Vec<TrendPoint>> {
    let mut by_state: BTreeMap<&str, Vec<&SaleRecord>> = BTreeMap::new();
    for sale in sales {
        by_state.entry(sale.state.as_str()).or_default().push(sale);
    }
    by_state
        .into_iter()
        .map(|(state, sales)| (state.to_string(), bucket_revenue(sales, bucket)))
        .collect()
}

pub fn total_revenue(sales: &[SaleRecord]) -> Decimal {
    sales.iter().map(|sale| sale.price).sum()
}

fn bucket_revenue<'a>(
    sales: impl IntoIterator<Item = &'a SaleRecord>,
    bucket: Bucket,
) -> Vec<TrendPoint> {
    let mut totals: BTreeMap<BucketKey, Decimal> = BTreeMap::new();
    for sale in sales {
        let key = BucketKey::truncate(sale.purchased_at.date(), bucket);
        *totals.entry(key).or_insert(Decimal::ZERO) += sale.price;
    }
    totals.into_iter().map(|(bucket, revenue)| TrendPoint { bucket, revenue }).collect()
}
