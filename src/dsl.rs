//! DSL parser and executor for record pipelines.
//!
//! Pipeline format (CMS Pipelines style):
//! ```text
//! PIPE INPUT
//! | SEARCH /central/ customerName,notes
//! | FILTER status = "paid"
//! | SORT total DESC
//! | PAGE 2 10
//! ?
//! ```
//!
//! - `PIPE INPUT` starts the pipeline, reading the input records
//! - `| <stage>` continues to the next stage
//! - `?` on its own line (or trailing) marks the end of the pipeline
//! - Lines starting with `#` are comments
//!
//! Stage position rules:
//! - First stage must be a source: INPUT or HOLE
//! - Any stage may follow; INPUT in the middle passes records through
//!
//! Supported stages:
//! - `INPUT` - Read the input records (first) or pass through (middle)
//! - `SEARCH /text/ f1,f2` - Case-insensitive text search over fields
//! - `FILTER field = "value"` - Keep records whose field renders as value
//! - `FILTER field != "value"` - Omit records whose field renders as value
//! - `BETWEEN field from to` - Keep records dated inside [from, to]; `*` is open
//! - `SORT field [ASC|DESC]` - Type-aware stable sort
//! - `PAGE page limit` - Keep one page and remember page metadata
//! - `TAKE n` / `SKIP n` - Keep the first n / drop the first n records
//! - `COUNT` - Replace the stream with one `{count: n}` record
//! - `HOLE` - Discard all input

use log::debug;
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::paginate::PageResult;
use crate::pipeline::{DateRange, Pipeline};
use crate::record::Record;
use crate::sort::SortDirection;

/// Per-stage execution summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    pub stage_name: String,
    pub input_count: usize,
    pub output_count: usize,
}

impl DebugInfo {
    pub fn new(stage_name: String, input_count: usize, output_count: usize) -> Self {
        Self {
            stage_name,
            input_count,
            output_count,
        }
    }
}

/// Page metadata captured by a `PAGE` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl From<&PageResult> for PageInfo {
    fn from(page: &PageResult) -> Self {
        Self {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

/// Result of running a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub input_count: usize,
    /// Metadata of the last `PAGE` stage, if any ran.
    pub page: Option<PageInfo>,
}

impl PipelineOutput {
    pub fn output_count(&self) -> usize {
        self.records.len()
    }
}

/// Parsed pipeline command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// INPUT - read input records or pass through
    Input,
    /// SEARCH /text/ f1,f2
    Search { query: String, fields: Vec<String> },
    /// FILTER field = "value"
    FilterEq { field: String, value: String },
    /// FILTER field != "value"
    FilterNe { field: String, value: String },
    /// BETWEEN field from to
    Between {
        field: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// SORT field [ASC|DESC]
    Sort {
        field: String,
        direction: SortDirection,
    },
    /// PAGE page limit
    Page { page: usize, limit: usize },
    /// TAKE n
    Take { n: usize },
    /// SKIP n
    Skip { n: usize },
    /// COUNT - replace the stream by its size
    Count,
    /// HOLE - discard all input, output nothing
    Hole,
}

impl Command {
    /// Can this stage be the first stage in a pipeline (source)?
    pub fn can_be_first(&self) -> bool {
        matches!(self, Command::Input | Command::Hole)
    }

    /// Get the stage name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Input => "INPUT",
            Command::Search { .. } => "SEARCH",
            Command::FilterEq { .. } | Command::FilterNe { .. } => "FILTER",
            Command::Between { .. } => "BETWEEN",
            Command::Sort { .. } => "SORT",
            Command::Page { .. } => "PAGE",
            Command::Take { .. } => "TAKE",
            Command::Skip { .. } => "SKIP",
            Command::Count => "COUNT",
            Command::Hole => "HOLE",
        }
    }
}

/// Execute a pipeline defined by DSL text on input records.
pub fn execute_pipeline(input: Vec<Record>, pipeline_text: &str) -> Result<PipelineOutput> {
    run(input, pipeline_text, None)
}

/// Execute a pipeline and report per-stage record counts.
pub fn execute_pipeline_debug(
    input: Vec<Record>,
    pipeline_text: &str,
) -> Result<(PipelineOutput, Vec<DebugInfo>)> {
    let mut debug_info = Vec::new();
    let output = run(input, pipeline_text, Some(&mut debug_info))?;
    Ok((output, debug_info))
}

fn run(
    input: Vec<Record>,
    pipeline_text: &str,
    mut debug_info: Option<&mut Vec<DebugInfo>>,
) -> Result<PipelineOutput> {
    let commands = parse_commands(pipeline_text)?;

    let Some(first) = commands.first() else {
        return Err(PipelineError::invalid_argument("Pipeline is empty"));
    };
    if commands.len() < 2 {
        return Err(PipelineError::invalid_argument(
            "Pipeline must have at least 2 stages",
        ));
    }
    if !first.can_be_first() {
        return Err(PipelineError::invalid_argument(format!(
            "{} cannot be the first stage (try INPUT or HOLE)",
            first.name()
        )));
    }

    // HOLE as a source produces an empty stream
    let mut current = match first {
        Command::Input => input,
        _ => Vec::new(),
    };
    let input_count = current.len();
    if let Some(info) = debug_info.as_deref_mut() {
        info.push(DebugInfo::new(first.name().to_string(), 0, input_count));
    }

    let mut page = None;
    for cmd in &commands[1..] {
        let before = current.len();
        current = apply_command(current, cmd, &mut page)?;
        debug!("{}: {} -> {} records", cmd.name(), before, current.len());
        if let Some(info) = debug_info.as_deref_mut() {
            info.push(DebugInfo::new(cmd.name().to_string(), before, current.len()));
        }
    }

    Ok(PipelineOutput {
        records: current,
        input_count,
        page,
    })
}

/// Parse DSL text into commands.
pub fn parse_commands(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // "PIPE COMMAND" - extract command after PIPE
        let line = if line.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("PIPE ")) {
            line[5..].trim()
        } else if line.eq_ignore_ascii_case("PIPE") {
            continue;
        } else {
            line
        };

        // Continuation lines: "| COMMAND ..."
        let line = match line.strip_prefix('|') {
            Some(stripped) => stripped.trim(),
            None => line,
        };

        let line = line.trim_end_matches('|').trim();
        let line = line.trim_end_matches('?').trim();
        if line.is_empty() {
            continue;
        }

        let cmd = parse_command(line).map_err(|message| PipelineError::Parse {
            line: line_num + 1,
            message,
        })?;
        commands.push(cmd);
    }

    Ok(commands)
}

/// Parse a single command line.
fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    let keyword = keyword.to_uppercase();
    let bare = |cmd: Command| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(format!("{keyword} takes no arguments (one stage per line)"))
        }
    };

    match keyword.as_str() {
        "INPUT" => bare(Command::Input),
        "SEARCH" => parse_search(rest),
        "FILTER" => parse_filter(rest),
        "BETWEEN" => parse_between(rest),
        "SORT" => parse_sort(rest),
        "PAGE" => parse_page(rest),
        "TAKE" => Ok(Command::Take {
            n: parse_count(rest, "TAKE")?,
        }),
        "SKIP" => Ok(Command::Skip {
            n: parse_count(rest, "SKIP")?,
        }),
        "COUNT" => bare(Command::Count),
        "HOLE" => bare(Command::Hole),
        _ => Err(format!("Unknown command: {keyword}")),
    }
}

/// SEARCH /text/ f1,f2
fn parse_search(rest: &str) -> std::result::Result<Command, String> {
    if rest.is_empty() {
        return Err("SEARCH requires a delimited query".to_string());
    }
    let (query, after) = parse_delimited_string(rest)?;
    let fields = parse_field_list(after);
    if fields.is_empty() {
        return Err("SEARCH requires at least one field".to_string());
    }
    Ok(Command::Search { query, fields })
}

/// FILTER field = "value" or FILTER field != "value"
fn parse_filter(rest: &str) -> std::result::Result<Command, String> {
    let Some(idx) = rest.find('=') else {
        return Err("FILTER requires = or != operator".to_string());
    };
    let (field, negate) = match rest[..idx].strip_suffix('!') {
        Some(field) => (field.trim(), true),
        None => (rest[..idx].trim(), false),
    };

    if field.is_empty() || field.contains(char::is_whitespace) {
        return Err("FILTER requires a single field name before the operator".to_string());
    }
    let (value, after) = parse_delimited_string(&rest[idx + 1..])?;
    if !after.trim().is_empty() {
        return Err(format!("Unexpected text after FILTER value: {}", after.trim()));
    }
    let field = field.to_string();

    if negate {
        Ok(Command::FilterNe { field, value })
    } else {
        Ok(Command::FilterEq { field, value })
    }
}

/// BETWEEN field from to, with `*` for an open bound
fn parse_between(rest: &str) -> std::result::Result<Command, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [field, from, to] = parts.as_slice() else {
        return Err("BETWEEN requires field, from and to".to_string());
    };
    let open = |s: &str| (s != "*").then(|| s.to_string());
    let (from, to) = (open(*from), open(*to));
    DateRange::parse(from.as_deref(), to.as_deref()).map_err(|e| e.to_string())?;
    Ok(Command::Between {
        field: field.to_string(),
        from,
        to,
    })
}

/// SORT field [ASC|DESC]
fn parse_sort(rest: &str) -> std::result::Result<Command, String> {
    let mut parts = rest.split_whitespace();
    let field = parts.next().ok_or("SORT requires a field")?.to_string();
    let direction = match parts.next() {
        Some(d) => d.parse::<SortDirection>().map_err(|e| e.to_string())?,
        None => SortDirection::Asc,
    };
    if parts.next().is_some() {
        return Err("SORT takes a field and an optional direction".to_string());
    }
    Ok(Command::Sort { field, direction })
}

/// PAGE page limit
fn parse_page(rest: &str) -> std::result::Result<Command, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [page, limit] = parts.as_slice() else {
        return Err("PAGE requires page and limit".to_string());
    };
    let page: usize = page.parse().map_err(|_| "Invalid page number")?;
    let limit: usize = limit.parse().map_err(|_| "Invalid page limit")?;
    if limit == 0 {
        return Err("PAGE limit must be at least 1".to_string());
    }
    Ok(Command::Page { page, limit })
}

fn parse_count(rest: &str, stage: &str) -> std::result::Result<usize, String> {
    rest.parse().map_err(|_| format!("{stage} requires a number"))
}

fn parse_field_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a delimited string using CMS Pipelines convention.
/// The first non-blank character is the delimiter, and the string
/// continues until the next occurrence of that delimiter.
/// Returns (extracted_string, rest_of_input).
fn parse_delimited_string(s: &str) -> std::result::Result<(String, &str), String> {
    let s = s.trim_start();
    let Some(delim) = s.chars().next() else {
        return Err("Expected delimited string".to_string());
    };
    let after_delim = &s[delim.len_utf8()..];

    match after_delim.find(delim) {
        Some(end) => Ok((
            after_delim[..end].to_string(),
            &after_delim[end + delim.len_utf8()..],
        )),
        None => Err(format!("Unclosed delimiter '{delim}'")),
    }
}

/// Apply a single command to records.
fn apply_command(
    records: Vec<Record>,
    cmd: &Command,
    page_info: &mut Option<PageInfo>,
) -> Result<Vec<Record>> {
    let pipeline = Pipeline::new(records);
    let out = match cmd {
        // INPUT in the middle of a pipeline just passes through
        Command::Input => pipeline,
        Command::Search { query, fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            pipeline.search(query, &fields)
        }
        Command::FilterEq { field, value } => pipeline.where_eq(field, value),
        Command::FilterNe { field, value } => pipeline.where_ne(field, value),
        Command::Between { field, from, to } => {
            let range = DateRange::parse(from.as_deref(), to.as_deref())?;
            pipeline.between(field, &range)
        }
        Command::Sort { field, direction } => pipeline.sort(field, *direction),
        Command::Page { page, limit } => {
            let result = pipeline.paginate(*page, *limit)?;
            *page_info = Some(PageInfo::from(&result));
            Pipeline::new(result.data)
        }
        Command::Take { n } => pipeline.take(*n),
        Command::Skip { n } => pipeline.skip(*n),
        Command::Count => {
            let count = pipeline.len() as i64;
            Pipeline::new(vec![Record::new().with("count", count)])
        }
        Command::Hole => Pipeline::default(),
    };
    Ok(out.collect())
}
