//! Fluent composition of the record stages, plus the list query every
//! list screen sends.
//!
//! ```
//! use record_pipeline::{Pipeline, Record, SortDirection};
//!
//! let records = vec![
//!     Record::new().with("customerName", "Padaria Central").with("total", 120),
//!     Record::new().with("customerName", "Mercado Sol").with("total", 80),
//!     Record::new().with("customerName", "Central Tintas").with("total", 300),
//! ];
//!
//! let page = Pipeline::new(records)
//!     .search("central", &["customerName"])
//!     .sort("total", SortDirection::Desc)
//!     .paginate(1, 10)
//!     .unwrap();
//!
//! assert_eq!(page.total, 2);
//! assert_eq!(page.data[0].get("customerName").unwrap().to_string(), "Central Tintas");
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::filter;
use crate::paginate::{PageResult, paginate};
use crate::record::Record;
use crate::sort::{SortDirection, sort};
use crate::value::{is_date_like, parse_instant};

/// An owned record sequence flowing through stages.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    records: Vec<Record>,
}

impl Pipeline {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Free-text search over `fields`.
    pub fn search(self, query: &str, fields: &[&str]) -> Self {
        Self::new(filter::filter(&self.records, query, fields))
    }

    /// Keep records whose field renders exactly as `value`.
    pub fn where_eq(self, field: &str, value: &str) -> Self {
        Self::new(
            self.records
                .into_iter()
                .filter(|r| r.present(field).is_some_and(|v| v.to_string() == value)),
        )
    }

    /// Drop records whose field renders exactly as `value`. Records
    /// without the field are kept.
    pub fn where_ne(self, field: &str, value: &str) -> Self {
        Self::new(
            self.records
                .into_iter()
                .filter(|r| !r.present(field).is_some_and(|v| v.to_string() == value)),
        )
    }

    /// Keep records whose date field falls inside `range`.
    pub fn between(self, field: &str, range: &DateRange) -> Self {
        Self::new(self.records.into_iter().filter(|r| {
            r.present(field)
                .and_then(|v| v.to_instant())
                .is_some_and(|at| range.contains(at))
        }))
    }

    pub fn sort(self, field: &str, direction: SortDirection) -> Self {
        Self::new(sort(&self.records, field, direction))
    }

    pub fn skip(self, n: usize) -> Self {
        Self::new(self.records.into_iter().skip(n))
    }

    pub fn take(self, n: usize) -> Self {
        Self::new(self.records.into_iter().take(n))
    }

    pub fn paginate(self, page: usize, limit: usize) -> Result<PageResult> {
        paginate(&self.records, page, limit)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn collect(self) -> Vec<Record> {
        self.records
    }
}

/// Inclusive date window. A bare-date upper bound covers that whole day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    from: Option<DateTime<Utc>>,
    to: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq)]
enum Bound {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

impl DateRange {
    /// Parse optional `from`/`to` bounds. Empty strings mean "unbounded".
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
        let from = non_empty(from).map(parse_bound).transpose()?;
        let to = match non_empty(to) {
            None => None,
            Some(s) if s.len() == 10 => Some(Bound::Day(parse_bound(s)?.date_naive())),
            Some(s) => Some(Bound::Instant(parse_bound(s)?)),
        };
        Ok(Self { from, to })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if self.from.is_some_and(|from| at < from) {
            return false;
        }
        match &self.to {
            None => true,
            Some(Bound::Day(day)) => at.date_naive() <= *day,
            Some(Bound::Instant(to)) => at <= *to,
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(s: &str) -> Result<DateTime<Utc>> {
    if !is_date_like(s) {
        return Err(PipelineError::invalid_argument(format!(
            "date bound '{s}' is not in YYYY-MM-DD form"
        )));
    }
    parse_instant(s)
        .ok_or_else(|| PipelineError::invalid_argument(format!("date bound '{s}' is not a valid date")))
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    crate::DEFAULT_PAGE_LIMIT
}

/// Search, filter, order and page a list screen's records in one call.
///
/// Mirrors the filter set list endpoints accept, so the same value can be
/// run locally or sent to a backend as a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    pub search: String,
    pub search_fields: Vec<String>,
    /// Exact-match filters such as `status` or `category`.
    pub filters: BTreeMap<String, String>,
    pub date_field: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort: Option<String>,
    pub direction: SortDirection,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            search_fields: Vec::new(),
            filters: BTreeMap::new(),
            date_field: None,
            date_from: None,
            date_to: None,
            sort: None,
            direction: SortDirection::Asc,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ListQuery {
    /// Run search → filters → date range → sort → paginate.
    pub fn run(&self, records: &[Record]) -> Result<PageResult> {
        let fields: Vec<&str> = self.search_fields.iter().map(String::as_str).collect();
        let mut pipeline = Pipeline::new(records.to_vec()).search(&self.search, &fields);
        for (field, value) in &self.filters {
            pipeline = pipeline.where_eq(field, value);
        }
        let range = DateRange::parse(self.date_from.as_deref(), self.date_to.as_deref())?;
        if !range.is_unbounded() {
            let field = self.date_field.as_deref().ok_or_else(|| {
                PipelineError::invalid_argument("a date range needs a date field")
            })?;
            pipeline = pipeline.between(field, &range);
        }
        if let Some(field) = &self.sort {
            pipeline = pipeline.sort(field, self.direction);
        }
        debug!(
            "list query matched {} of {} records",
            pipeline.len(),
            records.len()
        );
        pipeline.paginate(self.page, self.limit)
    }

    /// Key/value pairs for a list endpoint, omitting empty values.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        for (k, v) in &self.filters {
            params.push((k.clone(), v.clone()));
        }
        if let Some(from) = non_empty(self.date_from.as_deref()) {
            params.push(("dateFrom".to_string(), from.to_string()));
        }
        if let Some(to) = non_empty(self.date_to.as_deref()) {
            params.push(("dateTo".to_string(), to.to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort".to_string(), sort.clone()));
            params.push(("direction".to_string(), self.direction.to_string()));
        }
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("limit".to_string(), self.limit.to_string()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> Vec<Record> {
        vec![
            Record::new()
                .with("id", "s1")
                .with("customerName", "Padaria Central")
                .with("status", "paid")
                .with("date", "2024-01-10")
                .with("total", 120),
            Record::new()
                .with("id", "s2")
                .with("customerName", "Mercado Sol")
                .with("status", "pending")
                .with("date", "2024-01-31T18:30:00Z")
                .with("total", 80),
            Record::new()
                .with("id", "s3")
                .with("customerName", "Central Tintas")
                .with("status", "paid")
                .with("date", "2024-02-02")
                .with("total", 300),
            Record::new()
                .with("id", "s4")
                .with("customerName", "Sem Data")
                .with("status", "paid")
                .with("total", 10),
        ]
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.get("id").unwrap().to_string()).collect()
    }

    #[test]
    fn test_where_eq_matches_rendered_value() {
        let out = Pipeline::new(sales()).where_eq("status", "paid").collect();
        assert_eq!(ids(&out), vec!["s1", "s3", "s4"]);
        let out = Pipeline::new(sales()).where_eq("total", "80").collect();
        assert_eq!(ids(&out), vec!["s2"]);
    }

    #[test]
    fn test_between_inclusive_whole_day() {
        let range = DateRange::parse(Some("2024-01-10"), Some("2024-01-31")).unwrap();
        let out = Pipeline::new(sales()).between("date", &range).collect();
        assert_eq!(ids(&out), vec!["s1", "s2"]);
    }

    #[test]
    fn test_between_with_instant_upper_bound() {
        let range = DateRange::parse(None, Some("2024-01-31T12:00:00Z")).unwrap();
        let out = Pipeline::new(sales()).between("date", &range).collect();
        assert_eq!(ids(&out), vec!["s1"]);
    }

    #[test]
    fn test_date_range_rejects_garbage() {
        assert!(DateRange::parse(Some("31/01/2024"), None).is_err());
        assert!(DateRange::parse(Some("2024-02-30"), None).is_err());
        assert!(DateRange::parse(Some(""), Some("  ")).unwrap().is_unbounded());
    }

    #[test]
    fn test_skip_take() {
        let out = Pipeline::new(sales()).skip(1).take(2).collect();
        assert_eq!(ids(&out), vec!["s2", "s3"]);
    }

    #[test]
    fn test_list_query_runs_all_stages() {
        let query = ListQuery {
            search: "central".to_string(),
            search_fields: vec!["customerName".to_string()],
            filters: BTreeMap::from([("status".to_string(), "paid".to_string())]),
            sort: Some("total".to_string()),
            direction: SortDirection::Desc,
            limit: 1,
            ..ListQuery::default()
        };
        let page = query.run(&sales()).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(ids(&page.data), vec!["s3"]);
    }

    #[test]
    fn test_list_query_date_range_needs_field() {
        let query = ListQuery {
            date_from: Some("2024-01-01".to_string()),
            ..ListQuery::default()
        };
        assert!(matches!(
            query.run(&sales()),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_list_query_deserializes_camel_case_with_defaults() {
        let query: ListQuery =
            serde_json::from_str(r#"{"search": "sol", "dateFrom": "2024-01-01", "direction": "desc"}"#)
                .unwrap();
        assert_eq!(query.search, "sol");
        assert_eq!(query.date_from.as_deref(), Some("2024-01-01"));
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, crate::DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_to_params_skips_empty() {
        let query = ListQuery {
            filters: BTreeMap::from([("status".to_string(), "overdue".to_string())]),
            ..ListQuery::default()
        };
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("status".to_string(), "overdue".to_string()),
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }
}
