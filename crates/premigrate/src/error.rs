use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the premigrate pipeline.
#[derive(Error, Debug)]
pub enum PreMigrateError {
    /// SQLite error from the bundled executor.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database platform could not be auto-detected.
    #[error("Could not resolve database platform: {0}")]
    ResolvePlatform(String),

    /// An explicitly referenced SQL script does not exist.
    #[error("SQL script reference \"{}\" is invalid or cannot be found", .0.display())]
    ScriptRef(PathBuf),

    /// A SQL script could not be read or decoded.
    #[error("Could not read SQL script {}: {detail}", path.display())]
    ScriptRead { path: PathBuf, detail: String },

    /// A placeholder in a SQL script could not be resolved, or placeholders
    /// reference each other in a cycle.
    #[error("Placeholder error in SQL script {}: {detail}", path.display())]
    Placeholder { path: PathBuf, detail: String },

    /// A statement failed and `continue_on_error` was off.
    #[error("Statement {statement} of SQL script {} failed: {source}", script.display())]
    Execution {
        script: PathBuf,
        /// 1-based statement number within the script.
        statement: usize,
        #[source]
        source: Box<PreMigrateError>,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PreMigrateError>;
