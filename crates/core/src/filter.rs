use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderStatus;
use crate::errors::DomainError;

pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_TOP_N: usize = 50;

/// Which order status counts as a sale. Defaults to delivered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFilter(pub OrderStatus);

impl Default for StatusFilter {
    fn default() -> Self {
        Self(OrderStatus::Delivered)
    }
}

impl StatusFilter {
    pub fn matches(&self, status: &OrderStatus) -> bool {
        &self.0 == status
    }
}

/// Inclusive purchase-time window. `start <= end` always holds, including
/// for deserialized values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateBounds")]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Deserialize)]
struct DateBounds {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<DateBounds> for DateRange {
    type Error = DomainError;

    fn try_from(bounds: DateBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range spanning whole calendar days, from the start of `first` to the
    /// last instant of `last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self, DomainError> {
        if first > last {
            return Err(DomainError::InvalidRange {
                start: first.and_time(NaiveTime::default()),
                end: last.and_time(NaiveTime::default()),
            });
        }
        Self::new(first.and_time(NaiveTime::default()), last.and_time(end_of_day()))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        self.start <= *timestamp && *timestamp <= self.end
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or_default()
}

/// Every selection a caller can make, passed explicitly into each stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub status: StatusFilter,
    pub date_range: Option<DateRange>,
    pub state: Option<String>,
    pub category_pair: Option<(String, String)>,
    pub top_n: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            status: StatusFilter::default(),
            date_range: None,
            state: None,
            category_pair: None,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl FilterConfig {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_category_pair(
        mut self,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        self.category_pair = Some((first.into(), second.into()));
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(range) = &self.date_range {
            DateRange::new(range.start, range.end)?;
        }
        if self.top_n == 0 || self.top_n > MAX_TOP_N {
            return Err(DomainError::InvalidTopN(self.top_n));
        }
        Ok(())
    }
}
