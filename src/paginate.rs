//! Page slicing with the metadata list screens render their controls from.

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::record::Record;

/// One page of records plus counts describing the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub data: Vec<Record>,
    /// Record count before slicing.
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Slice out 1-indexed `page` of size `limit`.
///
/// `page` is not clamped: a page past the end (or page 0) yields empty
/// `data` while `total` still reports the full count. `limit == 0` is
/// rejected.
pub fn paginate(records: &[Record], page: usize, limit: usize) -> Result<PageResult> {
    if limit == 0 {
        return Err(PipelineError::invalid_argument("limit must be at least 1"));
    }
    let total = records.len();
    let data = match page.checked_sub(1).and_then(|p| p.checked_mul(limit)) {
        Some(start) if start < total => {
            let end = start.saturating_add(limit).min(total);
            records[start..end].to_vec()
        }
        _ => Vec::new(),
    };
    Ok(PageResult {
        data,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    })
}
