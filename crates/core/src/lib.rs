pub mod aggregate;
pub mod basket;
pub mod cache;
pub mod config;
pub mod cooccurrence;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod join;
pub mod normalize;
pub mod pipeline;

pub use aggregate::{
    orders_by_state, revenue_trend, revenue_trend_by_state, Bucket, BucketKey, TrendPoint,
};
pub use basket::{build_baskets, Basket, Baskets, DedupBasket, RawBasket};
pub use cache::{CacheStats, TableCache, TableFingerprint};
pub use cooccurrence::{
    count_for_pair, count_pairs, heatmap_labels, to_matrix, top_n, BasketVariant, CategoryPair,
    CategoryVocabulary, CountMatrix, PairCount, RankedPair,
};
pub use domain::order::{Order, OrderId, OrderItem, OrderStatus};
pub use domain::sale::{LineItemView, SaleRecord};
pub use errors::{ApplicationError, DomainError, RowError};
pub use filter::{DateRange, FilterConfig, StatusFilter, DEFAULT_TOP_N, MAX_TOP_N};
pub use join::{join_line_items, join_sales};
pub use normalize::{normalize, NormalizationReport, Normalized, NormalizedTables, RawTables};
pub use pipeline::{AnalysisReport, PairQuery, ReportOptions, SalesAnalysis};
