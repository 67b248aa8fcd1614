//! # premigrate-cli
//!
//! Command-line front end for the `premigrate` library: opens a SQLite
//! database, builds the configuration from flags and `PREMIGRATE_*`
//! environment variables (flags win), runs the bootstrap pipeline, and
//! prints a summary. `--dry-run` prints the filtered SQL without executing
//! anything.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use premigrate::{PreMigrate, PreMigrateConfig, PropertySource, ScriptEncoding};

#[derive(Parser, Debug)]
#[command(name = "premigrate", version, about = "Run prerequisite SQL scripts before schema migrations")]
struct Cli {
    /// SQLite database file (":memory:" for an in-memory database).
    #[arg(long)]
    database: PathBuf,

    /// Script references: one folder (trailing slash) or explicit .sql files.
    #[arg(long, value_delimiter = ',')]
    scripts: Option<Vec<String>>,

    /// Platform code override; skips auto-detection.
    #[arg(long)]
    platform_code: Option<String>,

    /// Keep executing remaining statements after one fails.
    #[arg(long)]
    continue_on_error: bool,

    /// Statement separator.
    #[arg(long)]
    separator: Option<String>,

    /// Script file encoding: utf-8, utf-8-lossy, or latin1.
    #[arg(long)]
    encoding: Option<ScriptEncoding>,

    /// Placeholder property, as key=value. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// Resolve and filter scripts, print the SQL, execute nothing.
    #[arg(long)]
    dry_run: bool,

    /// Print the execution report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = build_config(&cli);
    let properties = build_properties(&cli.properties)?;

    let mut conn = open_database(&cli.database)
        .with_context(|| format!("could not open database {}", cli.database.display()))?;

    let premigrate = PreMigrate::new(config, properties);

    if cli.dry_run {
        let preparation = premigrate.prepare(&mut conn)?;
        info!(platform_code = %preparation.platform_code, "Dry run");
        for script in &preparation.scripts {
            println!("-- {}", script.path.display());
            println!("{}", script.filtered);
        }
        return Ok(());
    }

    let report = premigrate.run(&mut conn)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.ran {
        println!(
            "Executed {} statement(s) from {} script(s) [platform: {}]",
            report.statements_total,
            report.scripts.len(),
            report.platform_code.as_deref().unwrap_or("unknown"),
        );
        for script in &report.scripts {
            println!("  {} ({} statement(s))", script.path.display(), script.statements);
        }
    } else {
        println!("Nothing executed (disabled or no scripts found)");
    }

    Ok(())
}

/// Environment config first, then flag overrides.
fn build_config(cli: &Cli) -> PreMigrateConfig {
    let mut config = PreMigrateConfig::from_env();

    if let Some(scripts) = &cli.scripts {
        config.sql_script_refs = scripts.clone();
    }
    if let Some(code) = &cli.platform_code {
        config.db_platform_code = Some(code.clone());
    }
    if cli.continue_on_error {
        config.continue_on_error = true;
    }
    if let Some(sep) = &cli.separator {
        config.separator = sep.clone();
    }
    if let Some(enc) = cli.encoding {
        config.sql_script_encoding = enc;
    }

    config
}

fn build_properties(pairs: &[String]) -> anyhow::Result<PropertySource> {
    let mut properties = PropertySource::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("--set value \"{pair}\" is not of the form key=value"))?;
        properties.set(key, value);
    }
    Ok(properties)
}

fn open_database(path: &Path) -> rusqlite::Result<rusqlite::Connection> {
    if path.as_os_str() == ":memory:" {
        rusqlite::Connection::open_in_memory()
    } else {
        rusqlite::Connection::open(path)
    }
}
