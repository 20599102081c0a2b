//! Per-order category baskets.
//!
//! The two basket kinds feed different counting semantics and are kept as
//! separate types so one can never be passed where the other is expected.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cooccurrence::BasketVariant;
use crate::domain::order::OrderId;
use crate::domain::sale::LineItemView;

/// Ordered labels of a basket, as read by the pair counter.
pub trait Basket {
    const VARIANT: BasketVariant;

    fn labels(&self) -> &[String];

    fn len(&self) -> usize {
        self.labels().len()
    }

    fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }
}

/// Every resolved category of an order, one entry per item, in item order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RawBasket(Vec<String>);

/// Distinct categories of an order, sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DedupBasket(Vec<String>);

impl RawBasket {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn push(&mut self, label: String) {
        self.0.push(label);
    }

    pub fn dedup(&self) -> DedupBasket {
        DedupBasket::from_labels(self.0.iter().cloned())
    }
}

impl DedupBasket {
    pub fn from_labels(labels: impl IntoIterator<Item = String>) -> Self {
        let mut labels = labels.into_iter().collect::<Vec<_>>();
        labels.sort();
        labels.dedup();
        Self(labels)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.binary_search_by(|probe| probe.as_str().cmp(label)).is_ok()
    }
}

impl Basket for RawBasket {
    const VARIANT: BasketVariant = BasketVariant::Raw;

    fn labels(&self) -> &[String] {
        &self.0
    }
}

impl Basket for DedupBasket {
    const VARIANT: BasketVariant = BasketVariant::Dedup;

    fn labels(&self) -> &[String] {
        &self.0
    }
}

/// Both basket variants, keyed by order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Baskets {
    raw: BTreeMap<OrderId, RawBasket>,
    dedup: BTreeMap<OrderId, DedupBasket>,
}

impl Baskets {
    pub fn raw(&self) -> &BTreeMap<OrderId, RawBasket> {
        &self.raw
    }

    pub fn dedup(&self) -> &BTreeMap<OrderId, DedupBasket> {
        &self.dedup
    }

    pub fn order_count(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Groups line items by order. Every order with at least one line item gets
/// a basket, possibly empty when none of its categories resolved.
pub fn build_baskets(line_items: &[LineItemView]) -> Baskets {
    let mut raw: BTreeMap<OrderId, RawBasket> = BTreeMap::new();
    for view in line_items {
        let basket = raw.entry(view.order_id.clone()).or_default();
        if let Some(label) = &view.category_name_english {
            basket.push(label.clone());
        }
    }

    let dedup = raw.iter().map(|(order_id, basket)| (order_id.clone(), basket.dedup())).collect();

    Baskets { raw, dedup }
}
