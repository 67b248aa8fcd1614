//! # premigrate
//!
//! Runs a small set of prerequisite SQL scripts against a database *before*
//! a schema-migration tool executes, so the objects migrations depend on
//! (typically a schema or catalog) already exist.
//!
//! The pipeline is four sequential stages:
//!
//! 1. Resolve a platform code — configured explicitly, or auto-detected from
//!    the database's product name ([`platform`]).
//! 2. Resolve script paths — `<platform>.sql` with a `default.sql` fallback
//!    from a folder, or an explicit validated file list ([`scripts`]).
//! 3. Filter each script through the environment — `${name}` /
//!    `${name:default}` placeholder substitution ([`substitute`]).
//! 4. Split on the statement separator and execute, with optional
//!    continue-on-error semantics ([`executor`]).
//!
//! Call [`PreMigrate::run`] with the same connection you are about to hand
//! to your migration tool:
//!
//! ```no_run
//! use premigrate::{PreMigrate, PreMigrateConfig, PropertySource};
//!
//! # fn main() -> premigrate::Result<()> {
//! let mut conn = rusqlite::Connection::open("app.db")?;
//!
//! let premigrate = PreMigrate::new(PreMigrateConfig::from_env(), PropertySource::new());
//! let report = premigrate.run(&mut conn)?;
//!
//! if report.ran {
//!     // ... now run the migration tool against `conn`.
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod platform;
pub mod runner;
pub mod scripts;
pub mod substitute;

mod error;

pub use config::{PreMigrateConfig, ScriptEncoding};
pub use error::{PreMigrateError, Result};
pub use platform::SqlExecutor;
pub use runner::{ExecutionReport, FilteredScript, PreMigrate, Preparation, ScriptReport};
pub use substitute::PropertySource;
