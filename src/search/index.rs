//! Distinct crop names present in a collection, used to populate the crop filter.

use std::collections::HashSet;

use crate::models::DirectoryRecord;

/// Every crop name appearing in `records`, in order of first occurrence.
pub fn unique_crops<R: DirectoryRecord>(records: &[R]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut crops = Vec::new();

    for crop in records.iter().flat_map(|r| r.crops()) {
        if seen.insert(crop.as_str()) {
            crops.push(crop.clone());
        }
    }

    crops
}
