//! Free-text search across a list of fields.

use crate::record::Record;

/// Keep records where any of `fields` holds text containing `query`,
/// ignoring case. Relative order is preserved.
///
/// An empty query returns the input unchanged. Only `Text` fields take
/// part: numbers, booleans and dates are never stringified for matching.
pub fn filter(records: &[Record], query: &str, fields: &[&str]) -> Vec<Record> {
    if query.is_empty() {
        return records.to_vec();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| matches_text(r, &needle, fields))
        .cloned()
        .collect()
}

/// Does any listed field contain the (already lowercased) needle?
pub(crate) fn matches_text(record: &Record, needle: &str, fields: &[&str]) -> bool {
    fields.iter().any(|field| {
        record
            .get(field)
            .and_then(|v| v.as_text())
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}
