use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::domain::order::OrderId;

/// Denormalized order x item x customer row. One record per order item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub state: String,
    pub price: Decimal,
    pub purchased_at: NaiveDateTime,
}

/// Denormalized item x product x translation row.
///
/// `category_name_english` is `None` when the product category has no
/// translation; such rows still belong to their order but carry no label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemView {
    pub order_id: OrderId,
    pub category_name_english: Option<String>,
}
