//! TQL Command-Line Driver
//!
//! Parses TQL into filters, replays persisted filters and runs filter-action
//! scripts against the filter engine.

mod formatter;
mod script;

use clap::{Parser, Subcommand};
use formatter::{Formatter, OutputFormat};
use std::path::{Path, PathBuf};
use tql_filter::{ColumnCatalog, FilterConfig, FilterEngine, FilterError, StoredFilter};
use tracing::{info, warn};

/// TQL Command-Line Driver
#[derive(Parser, Debug)]
#[command(name = "tql")]
#[command(version, about = "TQL filter engine driver")]
pub struct Args {
    /// Column catalog (JSON array of column metadata)
    #[arg(long, global = true)]
    pub columns: Option<PathBuf>,

    /// Filter engine configuration (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a TQL expression and print the resulting filters
    Parse {
        /// TQL expression
        tql: String,
    },
    /// Replay persisted filters and print the resulting TQL
    Replay {
        /// JSON array of stored filters
        file: PathBuf,
    },
    /// Execute a filter-action script
    Run {
        /// Script file, one action per line
        script: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tql_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let columns = load_columns(args.columns.as_deref())?;
    let config = load_config(args.config.as_deref())?;
    let formatter = formatter::create_formatter(args.format);
    let engine = FilterEngine::with_config(config).with_columns(columns);

    match args.command {
        Command::Parse { tql } => run_parse(engine, &tql, &*formatter),
        Command::Replay { file } => run_replay(engine, &file, &*formatter),
        Command::Run { script } => run_script(engine, &script, &*formatter),
    }
}

/// Read the column catalog, or an empty one.
fn load_columns(path: Option<&Path>) -> Result<ColumnCatalog, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let catalog = ColumnCatalog::from_json(&std::fs::read_to_string(path)?)?;
            info!(columns = catalog.len(), path = %path.display(), "Loaded column catalog");
            Ok(catalog)
        }
        None => Ok(ColumnCatalog::default()),
    }
}

/// Read the engine configuration, or the defaults.
fn load_config(path: Option<&Path>) -> Result<FilterConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(FilterConfig::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(FilterConfig::default()),
    }
}

/// Parse TQL and print the filters.
fn run_parse(
    mut engine: FilterEngine,
    tql: &str,
    formatter: &dyn Formatter,
) -> Result<(), Box<dyn std::error::Error>> {
    match engine.load_tql(tql) {
        Ok(_) => {
            let filters: Vec<_> = engine.filters().collect();
            println!("{}", formatter.format_filters(&filters));
            Ok(())
        }
        Err(FilterError::Parse(e)) => {
            eprint!("{}", e.format_with_source(tql));
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Replay stored filters and print the resulting TQL.
fn run_replay(
    mut engine: FilterEngine,
    file: &Path,
    formatter: &dyn Formatter,
) -> Result<(), Box<dyn std::error::Error>> {
    let stored = StoredFilter::list_from_json(&std::fs::read_to_string(file)?)?;
    engine.load_persisted(&stored)?;
    info!(count = engine.len(), "Replayed stored filters");

    let filters: Vec<_> = engine.filters().collect();
    println!("{}", formatter.format_filters(&filters));
    println!("{}", formatter.format_tql(&engine.to_tql()));
    Ok(())
}

/// Execute a script, continuing after failed lines.
fn run_script(
    mut engine: FilterEngine,
    file: &Path,
    formatter: &dyn Formatter,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let mut failures = 0;

    for (line_number, statement) in script::statements(&content) {
        let result = script::parse_action(statement)
            .and_then(|action| script::execute(&mut engine, action, formatter));
        match result {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!(
                    "{}",
                    formatter.format_error(&format!("line {}: {}", line_number, e))
                );
            }
        }
    }

    if failures > 0 {
        warn!(failures, "Script finished with errors");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tql_filter::ColumnType;

    #[test]
    fn test_load_columns_and_config() {
        let mut columns = tempfile::NamedTempFile::new().unwrap();
        write!(
            columns,
            r#"[{{"id": "0001", "name": "firstname", "type": "string"}},
                {{"id": "0002", "name": "birth", "type": "date"}}]"#
        )
        .unwrap();
        let catalog = load_columns(Some(columns.path())).unwrap();
        assert_eq!(catalog.display_name("0001"), "firstname");
        assert_eq!(catalog.column_type("0002"), ColumnType::Date);

        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"{{"utcOffsetMinutes": -300}}"#).unwrap();
        let config = load_config(Some(config.path())).unwrap();
        assert_eq!(config.utc_offset_minutes, -300);

        assert!(load_columns(None).unwrap().is_empty());
        assert_eq!(load_config(None).unwrap(), FilterConfig::default());
    }

    #[test]
    fn test_invalid_catalog_is_an_error() {
        let mut columns = tempfile::NamedTempFile::new().unwrap();
        write!(columns, "not json").unwrap();
        assert!(load_columns(Some(columns.path())).is_err());
    }

    #[test]
    fn test_run_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.tql");
        std::fs::write(
            &path,
            "# filters\nadd quality 0001 {\"invalid\": true}\nbogus line\ntql\n",
        )
        .unwrap();
        let formatter = formatter::create_formatter(OutputFormat::Json);
        run_script(FilterEngine::new(), &path, &*formatter).unwrap();
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "tql",
            "--format",
            "json",
            "parse",
            "(0001 is invalid)",
            "--columns",
            "columns.json",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.columns, Some(PathBuf::from("columns.json")));
        assert!(matches!(args.command, Command::Parse { tql } if tql == "(0001 is invalid)"));
    }
}
