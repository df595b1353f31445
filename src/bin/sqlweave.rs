//! sqlweave — compile query descriptions to SQL from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL a query description compiles to
//! sqlweave compile query.json --dialect mssql
//!
//! # Execute it (returning emulation included)
//! sqlweave run query.json --database-url mysql://root@localhost/app
//!
//! # Quoting and placeholder reference
//! sqlweave dialects
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlweave::prelude::*;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(version)]
#[command(about = "Compile structured query descriptions into dialect-correct SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlweave compile read.json --dialect pg
    sqlweave compile create.json --dialect mysql --no-returning
    sqlweave run read.json --database-url postgres://localhost/app --format json")]
struct Cli {
    /// Config file (defaults to $CONFIG_DIR/sqlweave/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL and bindings for a query description
    Compile {
        /// Query description (JSON)
        file: PathBuf,
        /// Target dialect
        #[arg(short, long, default_value = "pg")]
        dialect: String,
        /// Compile writes without RETURNING
        #[arg(long)]
        no_returning: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Execute a query description against a database
    Run {
        /// Query description (JSON)
        file: PathBuf,
        /// Database connection URL
        #[arg(long, env = "SQLWEAVE_DATABASE_URL")]
        database_url: String,
        /// Target dialect (inferred from the URL scheme when omitted)
        #[arg(short, long)]
        dialect: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the quoting and placeholder reference
    Dialects,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn,sqlweave=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Compile {
            file,
            dialect,
            no_returning,
            format,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let dialect: Dialect = dialect.parse()?;
            compile_query(file, dialect, config, *no_returning, *format)
        }
        Commands::Run {
            file,
            database_url,
            dialect,
            format,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let dialect = match dialect {
                Some(name) => name.parse()?,
                None => dialect_from_url(database_url)?,
            };
            run_query(file, database_url, dialect, config, *format, cli.verbose).await
        }
        Commands::Dialects => {
            show_dialects();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    CompilerConfig::load(path).context("Failed to load configuration")
}

fn read_query(file: &Path) -> Result<QueryJson> {
    let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a valid query description", file.display()))
}

fn dialect_from_url(url: &str) -> Result<Dialect> {
    let scheme = url.split("://").next().unwrap_or_default();
    match scheme {
        "postgres" | "postgresql" => Ok(Dialect::Postgres),
        "mysql" => Ok(Dialect::MySQL),
        "mariadb" => Ok(Dialect::MariaDB),
        other => bail!("Cannot infer a dialect from '{}://', pass --dialect", other),
    }
}

fn compile_query(
    file: &Path,
    dialect: Dialect,
    config: CompilerConfig,
    no_returning: bool,
    format: OutputFormat,
) -> Result<()> {
    let query = read_query(file)?;
    let compiler = QueryCompiler::new(dialect, config);
    let statement = compiler.compile_with(&query, CompileOptions::default().disable_returning(no_returning))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&statement)?);
        }
        OutputFormat::Table => {
            println!("{} {}", "Dialect:".dimmed(), dialect.to_string().cyan());
            println!("{}", "Generated SQL:".green().bold());
            println!("{}", statement.sql.white());
            if !statement.bindings.is_empty() {
                println!();
                println!("{}", "Bindings:".cyan());
                let generator = dialect.generator();
                for (i, value) in statement.bindings.iter().enumerate() {
                    println!("  {} = {}", generator.placeholder(i + 1), value.to_string().yellow());
                }
            }
        }
    }
    Ok(())
}

async fn run_query(
    file: &Path,
    database_url: &str,
    dialect: Dialect,
    config: CompilerConfig,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let query = read_query(file)?;
    if verbose {
        println!("{} {}", "Connecting to:".dimmed(), database_url);
    }

    let compiler = QueryCompiler::new(dialect, config);
    match dialect {
        Dialect::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .with_context(|| format!("Failed to connect to {}", database_url))?;
            print_execution(&compiler, &query, &PgExecutor::new(pool), format).await
        }
        Dialect::MySQL | Dialect::MariaDB => {
            let pool = MySqlPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .with_context(|| format!("Failed to connect to {}", database_url))?;
            print_execution(&compiler, &query, &MySqlExecutor::new(pool), format).await
        }
        Dialect::SqlServer | Dialect::Oracle => {
            bail!("No bundled driver for {}; use `compile` and run the SQL yourself", dialect)
        }
    }
}

async fn print_execution<E: Executor>(
    compiler: &QueryCompiler,
    query: &QueryJson,
    executor: &E,
    format: OutputFormat,
) -> Result<()> {
    match compiler.execute(query, executor).await? {
        QueryOutput::Rows { rows, decode_errors } => {
            format_output(&rows, format);
            for err in decode_errors {
                eprintln!(
                    "{} row {} column {}: {}",
                    "⚠ JSON decode:".yellow(),
                    err.row,
                    err.column.cyan(),
                    err.message
                );
            }
        }
        QueryOutput::Row(row) if row.is_empty() => {
            println!("{} {} (row not returned)", "✓".green(), query.operation());
        }
        QueryOutput::Row(row) => format_output(&[row], format),
        QueryOutput::Empty => println!("{} {}", "✓".green(), query.operation()),
    }
    Ok(())
}

fn format_output(results: &[Row], format: OutputFormat) {
    if results.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
        }
        OutputFormat::Table => {
            // Get column names from first row
            let columns: Vec<&String> = results[0].keys().collect();

            let mut widths: HashMap<&String, usize> = columns.iter().map(|c| (*c, c.len())).collect();
            for row in results {
                for (col, val) in row {
                    let len = val_to_string(val).chars().count();
                    if let Some(w) = widths.get_mut(col) {
                        *w = (*w).max(len);
                    }
                }
            }

            let header: Vec<String> = columns
                .iter()
                .map(|c| format!("{:width$}", c, width = widths[*c]))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = columns.iter().map(|c| "─".repeat(widths[*c])).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in results {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let val = row.get(c.as_str()).map(val_to_string).unwrap_or_default();
                        format!("{:width$}", val, width = widths[*c])
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", results.len().to_string().cyan());
        }
    }
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

fn show_dialects() {
    println!("{}", "sqlweave dialect reference".cyan().bold());
    println!();
    println!(
        "{:10} {:12} {:12} {:18} {}",
        "Dialect".white().bold(),
        "Identifier".white().bold(),
        "Placeholder".white().bold(),
        "Pagination".white().bold(),
        "Returning".white().bold()
    );
    println!("{}", "─".repeat(72).dimmed());

    for dialect in Dialect::ALL {
        let generator = dialect.generator();
        let pagination = match dialect {
            Dialect::Postgres | Dialect::MySQL | Dialect::MariaDB => "LIMIT / OFFSET",
            Dialect::SqlServer => "TOP / OFFSET FETCH",
            Dialect::Oracle => "OFFSET FETCH",
        };
        let returning = if dialect.supports_returning() { "native" } else { "emulated" };
        println!(
            "{:10} {:12} {:12} {:18} {}",
            dialect.to_string().cyan().bold(),
            quote(dialect, "col").yellow(),
            generator.placeholder(1).white(),
            pagination.dimmed(),
            returning
        );
    }
}
