//! Scoped cache of normalized tables.
//!
//! Entries are keyed by a blake3 digest of the raw rows, so reloading
//! unchanged source data reuses the previous normalization while any edit to
//! the sources produces a new key. The cache is an ordinary value owned by
//! its caller; dropping it or calling [`TableCache::clear`] releases every
//! entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::normalize::{normalize, Normalized, RawTables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableFingerprint([u8; 32]);

impl TableFingerprint {
    pub fn of(raw: &RawTables) -> Self {
        let mut hasher = blake3::Hasher::new();

        hash_section(&mut hasher, "orders", raw.orders.len());
        for row in &raw.orders {
            hash_fields(
                &mut hasher,
                &[
                    &row.order_id,
                    &row.customer_id,
                    &row.order_status,
                    &row.order_purchase_timestamp,
                ],
            );
        }

        hash_section(&mut hasher, "items", raw.items.len());
        for row in &raw.items {
            hash_fields(&mut hasher, &[&row.order_id, &row.product_id, &row.price]);
        }

        hash_section(&mut hasher, "customers", raw.customers.len());
        for row in &raw.customers {
            hash_fields(&mut hasher, &[&row.customer_id, &row.customer_state]);
        }

        hash_section(&mut hasher, "products", raw.products.len());
        for row in &raw.products {
            hash_fields(&mut hasher, &[&row.product_id]);
            match &row.product_category_name {
                Some(name) => hash_fields(&mut hasher, &[name]),
                None => {
                    hasher.update(&[0xff]);
                }
            }
        }

        hash_section(&mut hasher, "translations", raw.translations.len());
        for row in &raw.translations {
            hash_fields(
                &mut hasher,
                &[&row.product_category_name, &row.product_category_name_english],
            );
        }

        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for TableFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// length-prefixed so ("ab", "c") and ("a", "bc") hash differently
fn hash_fields(hasher: &mut blake3::Hasher, fields: &[&String]) {
    for field in fields {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
}

fn hash_section(hasher: &mut blake3::Hasher, name: &str, rows: usize) {
    hasher.update(name.as_bytes());
    hasher.update(&(rows as u64).to_le_bytes());
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<TableFingerprint, Arc<Normalized>>,
    hits: u64,
    misses: u64,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached normalization of `raw`, normalizing on a miss.
    pub fn get_or_normalize(&mut self, raw: &RawTables) -> (TableFingerprint, Arc<Normalized>) {
        let fingerprint = TableFingerprint::of(raw);
        if let Some(entry) = self.entries.get(&fingerprint) {
            self.hits += 1;
            debug!(event_name = "analysis.cache.hit", %fingerprint, "reusing normalized tables");
            return (fingerprint, Arc::clone(entry));
        }

        self.misses += 1;
        debug!(event_name = "analysis.cache.miss", %fingerprint, "normalizing source tables");
        let normalized = Arc::new(normalize(raw));
        self.entries.insert(fingerprint, Arc::clone(&normalized));
        (fingerprint, normalized)
    }

    pub fn get(&self, fingerprint: &TableFingerprint) -> Option<Arc<Normalized>> {
        self.entries.get(fingerprint).cloned()
    }

    /// Drops one entry. Returns whether it was present.
    pub fn invalidate(&mut self, fingerprint: &TableFingerprint) -> bool {
        self.entries.remove(fingerprint).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats { hits: self.hits, misses: self.misses, entries: self.entries.len() }
    }
}
