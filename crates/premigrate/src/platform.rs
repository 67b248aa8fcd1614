//! Database platform detection.
//!
//! Scripts are selected by a lower-case *platform code* (`postgresql.sql`,
//! `sqlite.sql`, ...). The code is either set explicitly in
//! [`PreMigrateConfig::db_platform_code`](crate::config::PreMigrateConfig) or
//! derived from the product name the database reports about itself. The codes
//! match the short names used by migration tooling `dbms` preconditions.

use crate::error::Result;

/// Seam to the database driver.
///
/// The pipeline only needs two things from a database: the product name (for
/// platform detection) and the ability to execute a single SQL statement. An
/// implementation for [`rusqlite::Connection`] is provided; other drivers can
/// implement the trait themselves.
pub trait SqlExecutor {
    /// Product name as reported by the database engine, e.g. `"SQLite"` or
    /// `"PostgreSQL"`. Used for platform auto-detection.
    fn product_name(&mut self) -> Result<String>;

    /// Execute one SQL statement. Returns the number of rows affected
    /// (zero for statements that do not change rows).
    fn execute_statement(&mut self, sql: &str) -> Result<usize>;
}

impl SqlExecutor for rusqlite::Connection {
    fn product_name(&mut self) -> Result<String> {
        Ok("SQLite".to_string())
    }

    fn execute_statement(&mut self, sql: &str) -> Result<usize> {
        let mut stmt = self.prepare(sql)?;
        if stmt.column_count() == 0 {
            Ok(stmt.execute([])?)
        } else {
            // Statements that return rows (SELECT, RETURNING) are drained so
            // that errors surface, but the rows themselves are discarded.
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
            Ok(0)
        }
    }
}

/// Map a database product name to a lower-case platform code.
///
/// Matching is case-insensitive and tolerant of verbose product strings
/// (`"Microsoft SQL Server"`, `"DB2/LINUXX8664"`). Unknown products map to
/// `"unsupported"` rather than an error, so a folder can still provide a
/// `default.sql` for them.
pub fn platform_code_from_product_name(product_name: &str) -> &'static str {
    let name = product_name.to_ascii_lowercase();

    if name.contains("postgres") {
        "postgresql"
    } else if name.contains("mariadb") {
        "mariadb"
    } else if name.contains("mysql") {
        "mysql"
    } else if name.contains("microsoft sql server") || name.contains("mssql") {
        "mssql"
    } else if name.contains("oracle") {
        "oracle"
    } else if name.contains("db2") {
        // Db2 for z/OS reports a product string mentioning the OS.
        if name.contains("z/os") || name.contains("dsn") {
            "db2z"
        } else {
            "db2"
        }
    } else if name.contains("derby") {
        "derby"
    } else if name.contains("hsql") {
        "hsqldb"
    } else if name == "h2" || name.starts_with("h2 ") {
        "h2"
    } else if name.contains("sqlite") {
        "sqlite"
    } else if name.contains("sybase") || name.contains("adaptive server") {
        "sybase"
    } else {
        "unsupported"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_product_names() {
        assert_eq!(platform_code_from_product_name("PostgreSQL"), "postgresql");
        assert_eq!(platform_code_from_product_name("MySQL"), "mysql");
        assert_eq!(platform_code_from_product_name("MariaDB"), "mariadb");
        assert_eq!(
            platform_code_from_product_name("Microsoft SQL Server"),
            "mssql"
        );
        assert_eq!(platform_code_from_product_name("Oracle"), "oracle");
        assert_eq!(platform_code_from_product_name("DB2/LINUXX8664"), "db2");
        assert_eq!(platform_code_from_product_name("DB2 for z/OS"), "db2z");
        assert_eq!(platform_code_from_product_name("Apache Derby"), "derby");
        assert_eq!(
            platform_code_from_product_name("HSQL Database Engine"),
            "hsqldb"
        );
        assert_eq!(platform_code_from_product_name("H2"), "h2");
        assert_eq!(platform_code_from_product_name("SQLite"), "sqlite");
        assert_eq!(
            platform_code_from_product_name("Adaptive Server Enterprise"),
            "sybase"
        );
    }

    #[test]
    fn test_unknown_product_name() {
        assert_eq!(
            platform_code_from_product_name("FoundationDB"),
            "unsupported"
        );
        assert_eq!(platform_code_from_product_name(""), "unsupported");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(platform_code_from_product_name("postgresql"), "postgresql");
        assert_eq!(platform_code_from_product_name("SQLITE"), "sqlite");
    }

    #[test]
    fn test_sqlite_executor_product_name() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        assert_eq!(conn.product_name().unwrap(), "SQLite");
    }

    #[test]
    fn test_sqlite_executor_statements() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_statement("CREATE TABLE t (x INTEGER)").unwrap();
        let affected = conn
            .execute_statement("INSERT INTO t (x) VALUES (1)")
            .unwrap();
        assert_eq!(affected, 1);

        // Row-returning statements are tolerated.
        assert_eq!(conn.execute_statement("SELECT x FROM t").unwrap(), 0);

        // Broken SQL surfaces as an error.
        assert!(conn.execute_statement("CREATE TABEL oops (x)").is_err());
    }
}
