//! Pipeline orchestration.
//!
//! [`PreMigrate`] ties the stages together: resolve the platform code,
//! resolve script paths, read and filter each script, then execute. It is
//! meant to run immediately before a schema-migration tool so that
//! prerequisite objects (typically a schema or catalog) exist when the
//! migrations start.
//!
//! All resolution and filtering completes before the first statement
//! executes: a bad script reference or an unresolvable placeholder aborts
//! the run without touching the database.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::PreMigrateConfig;
use crate::error::{PreMigrateError, Result};
use crate::executor::run_script;
use crate::platform::{platform_code_from_product_name, SqlExecutor};
use crate::scripts::resolve_scripts;
use crate::substitute::{substitute, PropertySource};

/// A resolved script with its text before and after placeholder substitution.
#[derive(Debug, Clone)]
pub struct FilteredScript {
    pub path: PathBuf,
    /// Script text as read from disk.
    pub raw: String,
    /// Script text after placeholder substitution.
    pub filtered: String,
}

/// Everything resolved up front, before any statement executes.
#[derive(Debug, Clone)]
pub struct Preparation {
    pub platform_code: String,
    pub scripts: Vec<FilteredScript>,
}

/// Per-script entry in an [`ExecutionReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub path: PathBuf,
    /// Number of statements attempted in this script.
    pub statements: usize,
}

/// Outcome of a premigrate run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Whether any script actually executed. `false` when the pipeline is
    /// disabled or no script was found.
    pub ran: bool,
    /// Effective platform code, `None` when disabled before detection.
    pub platform_code: Option<String>,
    pub scripts: Vec<ScriptReport>,
    /// Total statements attempted across all scripts.
    pub statements_total: usize,
}

impl ExecutionReport {
    fn skipped(platform_code: Option<String>) -> Self {
        Self {
            ran: false,
            platform_code,
            scripts: Vec::new(),
            statements_total: 0,
        }
    }
}

/// Runs prerequisite SQL scripts against a database.
///
/// Construct with a [`PreMigrateConfig`] and a [`PropertySource`], then call
/// [`run`](Self::run) with the database connection right before handing the
/// same database to the migration tool.
pub struct PreMigrate {
    config: PreMigrateConfig,
    properties: PropertySource,
}

impl PreMigrate {
    pub fn new(config: PreMigrateConfig, properties: PropertySource) -> Self {
        Self { config, properties }
    }

    /// Configuration and properties straight from the environment.
    pub fn from_env() -> Self {
        Self::new(PreMigrateConfig::from_env(), PropertySource::new())
    }

    /// Resolve the platform code and the filtered scripts without executing
    /// anything. This is the read-only half of [`run`](Self::run); the CLI
    /// uses it for dry runs.
    pub fn prepare<E: SqlExecutor>(&self, executor: &mut E) -> Result<Preparation> {
        let platform_code = self.resolve_platform_code(executor)?;

        let paths = resolve_scripts(&self.config.sql_script_refs, &platform_code)?;
        let mut scripts = Vec::with_capacity(paths.len());
        for path in paths {
            scripts.push(self.load_script(path)?);
        }

        Ok(Preparation {
            platform_code,
            scripts,
        })
    }

    /// Execute the pipeline: detect, resolve, filter, run.
    pub fn run<E: SqlExecutor>(&self, executor: &mut E) -> Result<ExecutionReport> {
        if !self.config.enabled {
            tracing::debug!("Premigrate disabled, not running SQL scripts");
            return Ok(ExecutionReport::skipped(None));
        }

        let preparation = self.prepare(executor)?;
        if preparation.scripts.is_empty() {
            tracing::debug!(
                platform_code = %preparation.platform_code,
                "No SQL scripts found, nothing to execute"
            );
            return Ok(ExecutionReport::skipped(Some(preparation.platform_code)));
        }

        let mut script_reports = Vec::with_capacity(preparation.scripts.len());
        let mut statements_total = 0;
        for script in &preparation.scripts {
            let statements = run_script(
                executor,
                &script.path,
                &script.filtered,
                &self.config.separator,
                self.config.continue_on_error,
            )?;
            statements_total += statements;
            script_reports.push(ScriptReport {
                path: script.path.clone(),
                statements,
            });
        }

        tracing::info!(
            platform_code = %preparation.platform_code,
            scripts = script_reports.len(),
            statements = statements_total,
            "Premigrate complete"
        );

        Ok(ExecutionReport {
            ran: true,
            platform_code: Some(preparation.platform_code),
            scripts: script_reports,
            statements_total,
        })
    }

    /// Explicit configuration wins; otherwise ask the database what it is.
    fn resolve_platform_code<E: SqlExecutor>(&self, executor: &mut E) -> Result<String> {
        if let Some(code) = &self.config.db_platform_code {
            tracing::debug!(platform_code = %code, "Using configured platform code");
            return Ok(code.clone());
        }

        let product_name = executor
            .product_name()
            .map_err(|e| PreMigrateError::ResolvePlatform(e.to_string()))?;
        let code = platform_code_from_product_name(&product_name);
        tracing::debug!(
            product_name = %product_name,
            platform_code = %code,
            "Auto-detected database platform"
        );
        Ok(code.to_string())
    }

    /// Read one script with the configured encoding and substitute its
    /// placeholders.
    fn load_script(&self, path: PathBuf) -> Result<FilteredScript> {
        let bytes = std::fs::read(&path).map_err(|e| PreMigrateError::ScriptRead {
            path: path.clone(),
            detail: e.to_string(),
        })?;

        let raw = self
            .config
            .sql_script_encoding
            .decode(&bytes)
            .map_err(|e| PreMigrateError::ScriptRead {
                path: path.clone(),
                detail: e.to_string(),
            })?
            .into_owned();

        let filtered =
            substitute(&raw, &self.properties).map_err(|e| PreMigrateError::Placeholder {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        if filtered != raw {
            tracing::debug!(script = %path.display(), "Applied placeholder substitution");
        } else {
            tracing::debug!(script = %path.display(), "No placeholders, using script as-is");
        }

        Ok(FilteredScript {
            path,
            raw,
            filtered,
        })
    }
}
