use std::cmp::Ordering;

use deunicode::deunicode;
use itertools::Itertools;

use crate::index::ScheduleRecord;

/// Case- and accent-folded form used for ordering and lookup.
pub fn fold_key(s: &str) -> String {
    deunicode(s).to_lowercase()
}

/// Folded text first; the raw string breaks ties so the order is total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    fold_key(a).cmp(&fold_key(b)).then_with(|| a.cmp(b))
}

/// Distinct non-empty track names across all records, sorted.
pub fn build_track_index(records: &[ScheduleRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.track.as_str())
        .filter(|t| !t.is_empty())
        .unique()
        .sorted_by(|a, b| locale_cmp(a, b))
        .map(str::to_string)
        .collect()
}
