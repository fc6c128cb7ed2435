//! Directory search: filtering by location and crop, ordering by name or distance.
//!
//! Searching is a linear scan over a collection snapshot. Nothing here touches storage, so the
//! same query over the same records always produces the same ordering.

mod distance;
mod index;

pub use distance::Coordinates;
pub use index::unique_crops;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::DirectoryRecord;

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Distance,
}

/// Filter and ordering applied to one collection.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring of the record location; empty matches everything.
    pub location: String,
    /// Exact crop the record must list.
    pub crop: Option<String>,
    pub sort: SortKey,
    /// Where the searching user is, for distance ranking.
    pub origin: Option<Coordinates>,
}

impl SearchQuery {
    /// Crop filter with the "all crops" empty value folded into `None`.
    fn crop_filter(&self) -> Option<&str> {
        self.crop.as_deref().filter(|c| !c.is_empty())
    }

    pub fn matches<R: DirectoryRecord>(&self, record: &R) -> bool {
        let location_ok = self.location.is_empty()
            || record
                .location()
                .to_lowercase()
                .contains(&self.location.to_lowercase());

        let crop_ok = match self.crop_filter() {
            Some(crop) => record.crops().iter().any(|c| c == crop),
            None => true,
        };

        location_ok && crop_ok
    }
}

/// A matching record with its distance from the query origin, when known.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit<R> {
    pub record: R,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Records matching the query's filters, in their original order.
pub fn filter_records<R: DirectoryRecord>(records: &[R], query: &SearchQuery) -> Vec<R> {
    records
        .iter()
        .filter(|r| query.matches(*r))
        .cloned()
        .collect()
}

/// Filter then sort. The input slice is left untouched.
pub fn search<R: DirectoryRecord>(records: &[R], query: &SearchQuery) -> Vec<SearchHit<R>> {
    let mut hits: Vec<SearchHit<R>> = filter_records(records, query)
        .into_iter()
        .map(|record| {
            let distance_km = match (query.origin, record.coordinates()) {
                (Some(origin), Some(coords)) => Some(origin.distance_km(&coords)),
                _ => None,
            };
            SearchHit {
                record,
                distance_km,
            }
        })
        .collect();

    match query.sort {
        SortKey::Name => {
            hits.sort_by(|a, b| compare_names(a.record.name(), b.record.name()));
        }
        SortKey::Distance => {
            hits.sort_by(|a, b| {
                compare_distances(a.distance_km, b.distance_km)
                    .then_with(|| compare_names(a.record.name(), b.record.name()))
            });
        }
    }

    hits
}

/// Case-insensitive ordering with the raw string as tie-breaker, so "Alice" < "bob" < "Zed".
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// Known distances first, ascending; unknown distances last.
fn compare_distances(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
