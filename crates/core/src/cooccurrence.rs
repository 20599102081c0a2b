//! Category co-occurrence counting.
//!
//! A basket contributes one count for every pair of positions `i < j`,
//! keyed by the canonical (lexicographically ordered) label pair. With raw
//! baskets a label repeated `k` times yields `C(k, 2)` self-pairs and two
//! labels with `k` and `m` occurrences yield `k * m` counts; dedup baskets
//! hold distinct labels, so every pair is counted at most once per order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::basket::Basket;
use crate::domain::product::CategoryTranslation;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketVariant {
    /// Item-level: repeats of a category count separately.
    Raw,
    /// Order-level: each category counts once per order.
    Dedup,
}

/// Unordered label pair stored as `(min, max)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryPair {
    first: String,
    second: String,
}

impl CategoryPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairCount {
    variant: BasketVariant,
    counts: BTreeMap<CategoryPair, u64>,
}

impl PairCount {
    pub fn new(variant: BasketVariant) -> Self {
        Self { variant, counts: BTreeMap::new() }
    }

    pub fn variant(&self) -> BasketVariant {
        self.variant
    }

    pub fn get(&self, a: &str, b: &str) -> u64 {
        self.counts.get(&CategoryPair::new(a, b)).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CategoryPair, u64)> {
        self.counts.iter().map(|(pair, count)| (pair, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum over all pairs.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Adds another partial count of the same variant into this one.
    pub fn merge(&mut self, other: PairCount) {
        debug_assert_eq!(self.variant, other.variant);
        for (pair, count) in other.counts {
            *self.counts.entry(pair).or_insert(0) += count;
        }
    }

    fn add_basket(&mut self, labels: &[String]) {
        for (i, left) in labels.iter().enumerate() {
            for right in &labels[i + 1..] {
                *self.counts.entry(CategoryPair::new(left.as_str(), right.as_str())).or_insert(0) +=
                    1;
            }
        }
    }
}

/// Accumulates pair counts over baskets of one variant.
pub fn count_pairs<'a, B, I>(baskets: I) -> PairCount
where
    B: Basket + 'a,
    I: IntoIterator<Item = &'a B>,
{
    let mut pair_count = PairCount::new(B::VARIANT);
    for basket in baskets {
        pair_count.add_basket(basket.labels());
    }
    pair_count
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedPair {
    pub pair: CategoryPair,
    pub count: u64,
}

/// The `n` most frequent pairs, count descending, ties by pair order.
pub fn top_n(pair_count: &PairCount, n: usize) -> Vec<RankedPair> {
    let mut ranked = pair_count
        .iter()
        .map(|(pair, count)| RankedPair { pair: pair.clone(), count })
        .collect::<Vec<_>>();
    // counts are iterated in pair order, so a stable sort keeps the tie-break
    ranked.sort_by(|left, right| right.count.cmp(&left.count));
    ranked.truncate(n);
    ranked
}

/// Distinct labels of the top `n` pairs, sorted. Bounds the matrix view.
pub fn heatmap_labels(pair_count: &PairCount, n: usize) -> Vec<String> {
    top_n(pair_count, n)
        .into_iter()
        .flat_map(|ranked| [ranked.pair.first, ranked.pair.second])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Symmetric count matrix over a fixed label order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CountMatrix {
    labels: Vec<String>,
    cells: Vec<Vec<u64>>,
}

impl CountMatrix {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.cells
    }

    pub fn get(&self, a: &str, b: &str) -> Option<u64> {
        let row = self.labels.iter().position(|label| label == a)?;
        let column = self.labels.iter().position(|label| label == b)?;
        Some(self.cells[row][column])
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Builds the matrix for `labels`; repeated labels keep their first position.
pub fn to_matrix(pair_count: &PairCount, labels: &[String]) -> CountMatrix {
    let mut unique: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if !unique.contains(label) {
            unique.push(label.clone());
        }
    }

    let cells = unique
        .iter()
        .map(|row| unique.iter().map(|column| pair_count.get(row, column)).collect())
        .collect();

    CountMatrix { labels: unique, cells }
}

/// Category labels that exist, independent of whether they were ever bought
/// together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryVocabulary(BTreeSet<String>);

impl CategoryVocabulary {
    pub fn from_translations(translations: &[CategoryTranslation]) -> Self {
        translations.iter().map(|translation| translation.category_name_english.clone()).collect()
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, labels: I) {
        self.0.extend(labels);
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for CategoryVocabulary {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Count for one pair. Zero means "never together"; a label outside the
/// vocabulary is an error instead.
pub fn count_for_pair(
    pair_count: &PairCount,
    vocabulary: &CategoryVocabulary,
    a: &str,
    b: &str,
) -> Result<u64, DomainError> {
    for label in [a, b] {
        if !vocabulary.contains(label) {
            return Err(DomainError::UnknownCategory(label.to_string()));
        }
    }
    Ok(pair_count.get(a, b))
}
