//! Raw source rows and their coercion into typed records.
//!
//! Raw rows mirror the source column names so a loader can deserialize them
//! straight from delimited text. Columns the analysis never reads (delivery
//! milestones, product dimensions, seller and freight data) have no field
//! here and are discarded by the loader.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::customer::{Customer, CustomerId};
use crate::domain::order::{Order, OrderId, OrderItem, OrderStatus};
use crate::domain::product::{CategoryTranslation, Product, ProductId, FALLBACK_CATEGORY};
use crate::errors::RowError;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrder {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrderItem {
    pub order_id: String,
    pub product_id: String,
    pub price: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCustomer {
    pub customer_id: String,
    pub customer_state: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProduct {
    pub product_id: String,
    #[serde(default)]
    pub product_category_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCategoryTranslation {
    pub product_category_name: String,
    pub product_category_name_english: String,
}

/// The five source tables as handed over by a loader.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTables {
    pub orders: Vec<RawOrder>,
    pub items: Vec<RawOrderItem>,
    pub customers: Vec<RawCustomer>,
    pub products: Vec<RawProduct>,
    pub translations: Vec<RawCategoryTranslation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTables {
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub translations: Vec<CategoryTranslation>,
}

/// Rows dropped while normalizing, with the reason for each.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub rejected: Vec<RowError>,
    pub categories_filled: usize,
}

impl NormalizationReport {
    pub fn malformed_timestamps(&self) -> usize {
        self.rejected
            .iter()
            .filter(|error| matches!(error, RowError::MalformedTimestamp { .. }))
            .count()
    }

    pub fn malformed_prices(&self) -> usize {
        self.rejected.iter().filter(|error| matches!(error, RowError::MalformedPrice { .. })).count()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Output of a normalization run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Normalized {
    pub tables: NormalizedTables,
    pub report: NormalizationReport,
}

pub fn normalize(raw: &RawTables) -> Normalized {
    let mut report = NormalizationReport::default();

    let orders = raw
        .orders
        .iter()
        .filter_map(|row| keep_or_record(normalize_order(row), &mut report))
        .collect::<Vec<_>>();

    let items = raw
        .items
        .iter()
        .filter_map(|row| keep_or_record(normalize_item(row), &mut report))
        .collect::<Vec<_>>();

    let customers = raw
        .customers
        .iter()
        .map(|row| Customer {
            id: CustomerId(row.customer_id.trim().to_string()),
            state: row.customer_state.trim().to_string(),
        })
        .collect::<Vec<_>>();

    let products = raw
        .products
        .iter()
        .map(|row| {
            let category_name = match row.product_category_name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    report.categories_filled += 1;
                    FALLBACK_CATEGORY.to_string()
                }
            };
            Product { id: ProductId(row.product_id.trim().to_string()), category_name }
        })
        .collect::<Vec<_>>();

    let translations = raw
        .translations
        .iter()
        .map(|row| CategoryTranslation {
            category_name: row.product_category_name.trim().to_string(),
            category_name_english: row.product_category_name_english.trim().to_string(),
        })
        .collect::<Vec<_>>();

    info!(
        event_name = "analysis.normalize.completed",
        orders = orders.len(),
        items = items.len(),
        customers = customers.len(),
        products = products.len(),
        translations = translations.len(),
        rejected_rows = report.rejected.len(),
        categories_filled = report.categories_filled,
        "normalized source tables"
    );

    Normalized {
        tables: NormalizedTables { orders, items, customers, products, translations },
        report,
    }
}

fn keep_or_record<T>(result: Result<T, RowError>, report: &mut NormalizationReport) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(event_name = "analysis.normalize.row_rejected", %error, "dropping row");
            report.rejected.push(error);
            None
        }
    }
}

fn normalize_order(row: &RawOrder) -> Result<Order, RowError> {
    let purchased_at = parse_timestamp(&row.order_purchase_timestamp).ok_or_else(|| {
        RowError::MalformedTimestamp {
            order_id: row.order_id.clone(),
            value: row.order_purchase_timestamp.clone(),
        }
    })?;

    Ok(Order {
        id: OrderId(row.order_id.trim().to_string()),
        customer_id: CustomerId(row.customer_id.trim().to_string()),
        status: OrderStatus::parse(&row.order_status),
        purchased_at,
    })
}

fn normalize_item(row: &RawOrderItem) -> Result<OrderItem, RowError> {
    let price = Decimal::from_str(row.price.trim())
        .ok()
        .filter(|price| !price.is_sign_negative())
        .ok_or_else(|| RowError::MalformedPrice {
            order_id: row.order_id.clone(),
            value: row.price.clone(),
        })?;

    Ok(OrderItem {
        order_id: OrderId(row.order_id.trim().to_string()),
        product_id: ProductId(row.product_id.trim().to_string()),
        price,
    })
}

/// Parses a purchase timestamp. A bare date is read as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
