//! CLI tool to run record pipelines over JSON record sets.
//!
//! Usage:
//!   pipe-run run <pipeline.pipe> <records.json> [-o out] [--format csv|json]
//!   pipe-run query <records.json> [--search S --fields a,b] [--where k=v] [--sort F]
//!   pipe-run validate <rules.yml> <record.json>
//!   pipe-run export <records.json> <name> [--dir D]
//!   pipe-run session [--clear]
//!
//! If no output file is specified, writes to stdout. Counts go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use clap::Parser;
use eyre::{Context, Result};
use log::info;

use record_pipeline::cli::{Cli, Command, OutputFormat};
use record_pipeline::config::Config;
use record_pipeline::{
    FileSessionStore, FileSink, ListQuery, Record, RuleSet, SessionStore,
    execute_pipeline, execute_pipeline_debug, export_flat, export_to_sink,
    records_from_json_str, validate,
};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init()?;
    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file '{}'", path.display()))?;
    records_from_json_str(&text)
        .with_context(|| format!("Failed to parse records in '{}'", path.display()))
}

fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(out_path) => {
            if let Some(parent) = out_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory for '{}'", out_path.display())
                })?;
            }
            fs::write(out_path, contents)
                .with_context(|| format!("Failed to write '{}'", out_path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.is_empty() && !contents.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Run {
            pipeline,
            records,
            output,
            format,
            delimiter,
            trace,
        } => {
            let pipeline_text = fs::read_to_string(&pipeline).with_context(|| {
                format!("Failed to read pipeline file '{}'", pipeline.display())
            })?;
            let input = read_records(&records)?;

            let result = if trace {
                let (result, stages) = execute_pipeline_debug(input, &pipeline_text)?;
                for stage in &stages {
                    eprintln!(
                        "  {:<8} {:>6} -> {:>6}",
                        stage.stage_name, stage.input_count, stage.output_count
                    );
                }
                result
            } else {
                execute_pipeline(input, &pipeline_text)?
            };

            let contents = match format {
                OutputFormat::Csv => {
                    export_flat(&result.records, delimiter.unwrap_or(config.delimiter))
                        .unwrap_or_default()
                }
                OutputFormat::Json => serde_json::to_string_pretty(&result.records)?,
            };
            write_output(output.as_deref(), &contents)?;

            eprintln!(
                "Processed {} -> {} records",
                result.input_count,
                result.output_count()
            );
            if let Some(page) = result.page {
                eprintln!(
                    "Page {} of {} ({} total, {} per page)",
                    page.page, page.total_pages, page.total, page.limit
                );
            }
        }
        Command::Query {
            records,
            search,
            fields,
            filters,
            date_field,
            from,
            to,
            sort,
            direction,
            page,
            limit,
        } => {
            let query = ListQuery {
                search,
                search_fields: fields,
                filters: filters.into_iter().collect(),
                date_field,
                date_from: from,
                date_to: to,
                sort,
                direction,
                page,
                limit: limit.unwrap_or(config.page_limit),
            };
            let input = read_records(&records)?;
            let result = query.run(&input)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            eprintln!(
                "Page {} of {} ({} matching of {})",
                result.page,
                result.total_pages,
                result.total,
                input.len()
            );
        }
        Command::Validate { rules, record } => {
            let rules_text = fs::read_to_string(&rules)
                .with_context(|| format!("Failed to read rules file '{}'", rules.display()))?;
            let rules: RuleSet = serde_yaml::from_str(&rules_text)
                .with_context(|| format!("Failed to parse rules in '{}'", rules.display()))?;
            let record_text = fs::read_to_string(&record)
                .with_context(|| format!("Failed to read record file '{}'", record.display()))?;
            let record: Record = serde_json::from_str(&record_text)
                .with_context(|| format!("Failed to parse record in '{}'", record.display()))?;

            let result = validate(&record, &rules);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_valid() {
                eprintln!("Invalid fields: {}", result.failed_fields().join(", "));
                process::exit(1);
            }
        }
        Command::Export {
            records,
            name,
            dir,
            delimiter,
        } => {
            let input = read_records(&records)?;
            let mut sink = FileSink::new(dir.unwrap_or(config.export_dir));
            match export_to_sink(
                &input,
                &name,
                delimiter.unwrap_or(config.delimiter),
                &mut sink,
            )? {
                Some(path) => eprintln!("Exported {} records to {}", input.len(), path.display()),
                None => eprintln!("Nothing to export"),
            }
        }
        Command::Session { clear } => {
            let mut store = FileSessionStore::new(&config.session_path);
            if clear {
                store.clear().context("Failed to clear session")?;
                info!("signed out");
            } else {
                match store.load()? {
                    Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
                    None => eprintln!("Not signed in"),
                }
            }
        }
    }

    Ok(())
}
