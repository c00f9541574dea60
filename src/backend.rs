//! The remote side of a list screen.
//!
//! Transport is not this crate's business: a [`Backend`] takes an endpoint
//! path and an optional JSON payload and hands back JSON. Tenant scoping,
//! auth headers and retries all live behind the trait.

use std::fmt;

use log::debug;

use crate::error::{PipelineError, Result};
use crate::pipeline::ListQuery;
use crate::record::Record;

/// JSON request/response collaborator.
pub trait Backend {
    fn get(&mut self, endpoint: &str) -> Result<serde_json::Value>;
    fn post(&mut self, endpoint: &str, payload: &serde_json::Value) -> Result<serde_json::Value>;
    fn put(&mut self, endpoint: &str, payload: &serde_json::Value) -> Result<serde_json::Value>;
    fn patch(&mut self, endpoint: &str, payload: &serde_json::Value)
    -> Result<serde_json::Value>;
    fn delete(&mut self, endpoint: &str) -> Result<serde_json::Value>;
}

/// Record collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Sales,
    Accounts,
    Products,
    Appointments,
    Travels,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Sales => "/sales",
            Resource::Accounts => "/accounts",
            Resource::Products => "/products",
            Resource::Appointments => "/appointments",
            Resource::Travels => "/travels",
        }
    }

    /// `/sales?status=paid&page=1`. Keys and values are form-urlencoded.
    pub fn list_endpoint(&self, filters: &[(String, String)]) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(filters)
            .finish();
        format!("{}?{}", self.path(), query)
    }

    pub fn item_endpoint(&self, id: &str) -> String {
        let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        format!("{}/{}", self.path(), id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path()[1..])
    }
}

/// Ask the backend for one page of `resource` matching `query`.
///
/// Accepts either a bare JSON array or an envelope with a `data` array.
pub fn fetch_records(
    backend: &mut dyn Backend,
    resource: Resource,
    query: &ListQuery,
) -> Result<Vec<Record>> {
    let endpoint = resource.list_endpoint(&query.to_params());
    debug!("GET {endpoint}");
    let body = backend.get(&endpoint)?;
    let items = match body {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut envelope) => match envelope.remove("data") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(PipelineError::Backend(format!(
                    "{resource}: response has no data array"
                )));
            }
        },
        other => {
            return Err(PipelineError::Backend(format!(
                "{resource}: expected a list, got {other}"
            )));
        }
    };
    items.into_iter().map(Record::from_json).collect()
}
