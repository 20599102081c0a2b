//! End-to-end analysis over one set of normalized tables.
//!
//! Everything that does not depend on the caller's filters (line items,
//! baskets, pair counts, the category vocabulary) is derived once when the
//! analysis is built. [`SalesAnalysis::report`] recomputes the filtered sales
//! aggregates from scratch on every call.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::aggregate::{
    orders_by_state, revenue_trend, revenue_trend_by_state, states, total_revenue, Bucket,
    TrendPoint,
};
use crate::basket::{build_baskets, Baskets};
use crate::cooccurrence::{
    count_for_pair, count_pairs, heatmap_labels, to_matrix, top_n, BasketVariant,
    CategoryVocabulary, CountMatrix, PairCount, RankedPair,
};
use crate::domain::sale::SaleRecord;
use crate::errors::DomainError;
use crate::filter::{FilterConfig, StatusFilter};
use crate::join::{join_line_items, join_sales, join_sales_filtered};
use crate::normalize::{NormalizationReport, Normalized};

/// Report settings that do not narrow the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    pub bucket: Bucket,
    /// Number of top pairs whose labels span the matrix.
    pub heatmap_pairs: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { bucket: Bucket::Month, heatmap_pairs: 20 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PairQuery {
    pub first: String,
    pub second: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub sale_records: usize,
    pub distinct_orders: usize,
    pub total_revenue: Decimal,
    pub orders_by_state: BTreeMap<String, usize>,
    pub revenue_trend: Vec<TrendPoint>,
    pub revenue_trend_by_state: BTreeMap<String, Vec<TrendPoint>>,
    pub top_pairs: Vec<RankedPair>,
    pub raw_top_pairs: Vec<RankedPair>,
    pub heatmap: CountMatrix,
    pub pair_query: Option<PairQuery>,
}

impl AnalysisReport {
    /// True when no sale survived the filters.
    pub fn has_no_sales(&self) -> bool {
        self.sale_records == 0
    }
}

#[derive(Debug, Clone)]
pub struct SalesAnalysis {
    normalized: Arc<Normalized>,
    baskets: Baskets,
    raw_pairs: PairCount,
    dedup_pairs: PairCount,
    vocabulary: CategoryVocabulary,
    available_states: Vec<String>,
}

impl SalesAnalysis {
    pub fn new(normalized: Arc<Normalized>) -> Self {
        let tables = &normalized.tables;

        let line_items = join_line_items(&tables.items, &tables.products, &tables.translations);
        let baskets = build_baskets(&line_items);
        let raw_pairs = count_pairs(baskets.raw().values());
        let dedup_pairs = count_pairs(baskets.dedup().values());

        let mut vocabulary = CategoryVocabulary::from_translations(&tables.translations);
        vocabulary.extend(line_items.iter().filter_map(|view| view.category_name_english.clone()));

        let delivered = join_sales(
            &tables.orders,
            &tables.items,
            &tables.customers,
            &StatusFilter::default(),
            None,
            None,
        );
        let available_states = states(&delivered);

        info!(
            event_name = "analysis.pipeline.prepared",
            baskets = baskets.order_count(),
            raw_pairs = raw_pairs.len(),
            dedup_pairs = dedup_pairs.len(),
            categories = vocabulary.len(),
            states = available_states.len(),
            "prepared co-occurrence statistics"
        );

        Self { normalized, baskets, raw_pairs, dedup_pairs, vocabulary, available_states }
    }

    pub fn normalization_report(&self) -> &NormalizationReport {
        &self.normalized.report
    }

    pub fn baskets(&self) -> &Baskets {
        &self.baskets
    }

    pub fn pair_count(&self, variant: BasketVariant) -> &PairCount {
        match variant {
            BasketVariant::Raw => &self.raw_pairs,
            BasketVariant::Dedup => &self.dedup_pairs,
        }
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    /// States with at least one delivered sale, for populating a selector.
    /// Always uses the delivered status; see [`Self::available_states_for`].
    pub fn available_states(&self) -> &[String] {
        &self.available_states
    }

    /// States with at least one sale under `status`, unbounded by dates.
    pub fn available_states_for(&self, status: &StatusFilter) -> Vec<String> {
        if *status == StatusFilter::default() {
            return self.available_states.clone();
        }
        let tables = &self.normalized.tables;
        states(&join_sales(&tables.orders, &tables.items, &tables.customers, status, None, None))
    }

    pub fn sales(&self, filter: &FilterConfig) -> Vec<SaleRecord> {
        let tables = &self.normalized.tables;
        join_sales_filtered(&tables.orders, &tables.items, &tables.customers, filter)
    }

    pub fn top_pairs(
        &self,
        variant: BasketVariant,
        filter: &FilterConfig,
    ) -> Result<Vec<RankedPair>, DomainError> {
        filter.validate()?;
        Ok(top_n(self.pair_count(variant), filter.top_n))
    }

    pub fn heatmap(&self, variant: BasketVariant, heatmap_pairs: usize) -> CountMatrix {
        let pair_count = self.pair_count(variant);
        to_matrix(pair_count, &heatmap_labels(pair_count, heatmap_pairs))
    }

    pub fn pair_count_for(&self, first: &str, second: &str) -> Result<u64, DomainError> {
        count_for_pair(&self.dedup_pairs, &self.vocabulary, first, second)
    }

    pub fn report(
        &self,
        filter: &FilterConfig,
        options: ReportOptions,
    ) -> Result<AnalysisReport, DomainError> {
        filter.validate()?;

        let pair_query = filter
            .category_pair
            .as_ref()
            .map(|(first, second)| {
                self.pair_count_for(first, second).map(|count| PairQuery {
                    first: first.clone(),
                    second: second.clone(),
                    count,
                })
            })
            .transpose()?;

        let sales = self.sales(filter);
        let orders_by_state = orders_by_state(&sales);
        let report = AnalysisReport {
            sale_records: sales.len(),
            distinct_orders: orders_by_state.values().sum(),
            total_revenue: total_revenue(&sales),
            revenue_trend: revenue_trend(&sales, options.bucket, None),
            revenue_trend_by_state: revenue_trend_by_state(&sales, options.bucket),
            orders_by_state,
            top_pairs: top_n(&self.dedup_pairs, filter.top_n),
            raw_top_pairs: top_n(&self.raw_pairs, filter.top_n),
            heatmap: self.heatmap(BasketVariant::Dedup, options.heatmap_pairs),
            pair_query,
        };

        info!(
            event_name = "analysis.pipeline.report",
            sale_records = report.sale_records,
            distinct_orders = report.distinct_orders,
            state = filter.state.as_deref().unwrap_or("all"),
            top_n = filter.top_n,
            "computed analysis report"
        );
        Ok(report)
    }
}
