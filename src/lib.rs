//! # record-pipeline
//!
//! Client-side processing for business record lists: sales, accounts,
//! products, appointments and travels.
//!
//! Records are schema-less flat maps of scalar [`Value`]s. They flow through
//! a fixed set of stages:
//!
//! - **Search**: case-insensitive text match over chosen fields
//! - **Sort**: type-aware, stable ordering by one field
//! - **Paginate**: a 1-based page plus totals
//! - **Validate**: declarative per-field rules, failures as data
//! - **Export**: flat delimited text for spreadsheets
//!
//! Stages compose through [`Pipeline`], through a one-shot [`ListQuery`],
//! or through the CMS Pipelines style text DSL in [`dsl`].
//!
//! ## Example
//!
//! ```
//! use record_pipeline::{Record, execute_pipeline};
//!
//! let sales = vec![
//!     Record::new().with("id", "s1").with("status", "paid").with("total", 120),
//!     Record::new().with("id", "s2").with("status", "pending").with("total", 80),
//!     Record::new().with("id", "s3").with("status", "paid").with("total", 300),
//! ];
//!
//! let pipeline = r#"
//! PIPE INPUT
//! | FILTER status = "paid"
//! | SORT total DESC
//! | TAKE 1
//! ?
//! "#;
//!
//! let output = execute_pipeline(sales, pipeline).unwrap();
//! assert_eq!(output.input_count, 3);
//! assert_eq!(output.records[0].get("id").unwrap().to_string(), "s3");
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod dsl;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod paginate;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod sort;
pub mod status;
pub mod validate;
pub mod value;

/// Page size used when none is given.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

pub use backend::{Backend, Resource, fetch_records};
pub use dsl::{
    Command, DebugInfo, PageInfo, PipelineOutput, execute_pipeline, execute_pipeline_debug,
    parse_commands,
};
pub use error::{PipelineError, Result};
pub use export::{DEFAULT_DELIMITER, ExportSink, FileSink, export_flat, export_to_sink};
pub use filter::filter;
pub use paginate::{PageResult, paginate};
pub use pipeline::{DateRange, ListQuery, Pipeline};
pub use record::{Record, records_from_json_str};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionStore, Tenant, Theme, ThemeSurface,
    User, apply_theme, reset_theme,
};
pub use sort::{SortDirection, compare_values, sort};
pub use status::EntityStatus;
pub use validate::{FieldRule, RuleSet, RuleViolation, ValidationResult, validate};
pub use value::Value;
