//! Type-aware sorting by a single field.
//!
//! The comparison kind is inferred per pair, at comparison time:
//!
//! 1. both values read as numbers: numeric order
//! 2. both values are dates or date-like text: chronological order
//! 3. otherwise: native order of the scalar (lexicographic for text)
//!
//! Absent and `Null` fields compare greater than every defined value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::record::Record;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(PipelineError::invalid_argument(format!(
                "unsupported sort direction '{other}' (expected asc or desc)"
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Compare two (possibly absent) field values in ascending order.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            if let (Some(x), Some(y)) = (a.to_number(), b.to_number()) {
                return x.total_cmp(&y);
            }
            if let (Some(x), Some(y)) = (a.to_instant(), b.to_instant()) {
                return x.cmp(&y);
            }
            a.native_cmp(b)
        }
    }
}

/// Return a new sequence ordered by `field`. The input is left untouched.
///
/// The sort is stable: records with equal keys keep their input order in
/// both directions.
pub fn sort(records: &[Record], field: &str, direction: SortDirection) -> Vec<Record> {
    let keys: Vec<Option<&Value>> = records.iter().map(|r| r.present(field)).collect();
    let mut order: Vec<usize> = (0..records.len()).collect();
    stable_merge_sort(&mut order, |a, b| {
        let ord = compare_values(keys[a], keys[b]);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    order.into_iter().map(|i| records[i].clone()).collect()
}

// `slice::sort_by` may panic when the comparator is not a total order, and
// per-pair inference is not transitive over a column mixing numeric text,
// plain text and numbers. This merge never panics and is stable.
fn stable_merge_sort<F>(order: &mut Vec<usize>, cmp: F)
where
    F: Fn(usize, usize) -> Ordering,
{
    let n = order.len();
    let mut buf = order.clone();
    let mut width = 1;
    while width < n {
        let mut start = 0;
        while start < n {
            let mid = (start + width).min(n);
            let end = (start + 2 * width).min(n);
            let (mut i, mut j, mut k) = (start, mid, start);
            while i < mid && j < end {
                if cmp(order[j], order[i]) == Ordering::Less {
                    buf[k] = order[j];
                    j += 1;
                } else {
                    buf[k] = order[i];
                    i += 1;
                }
                k += 1;
            }
            while i < mid {
                buf[k] = order[i];
                i += 1;
                k += 1;
            }
            while j < end {
                buf[k] = order[j];
                j += 1;
                k += 1;
            }
            start = end;
        }
        std::mem::swap(order, &mut buf);
        width *= 2;
    }
}
