//! SQL script execution.
//!
//! A script is split into individual statements on the configured separator
//! and each statement is handed to the [`SqlExecutor`] in order. The splitter
//! understands enough SQL lexing to never split inside string literals,
//! quoted identifiers, or comments; comments are stripped from the executed
//! statements.

use std::path::Path;

use crate::error::{PreMigrateError, Result};
use crate::platform::SqlExecutor;

/// Split a SQL script into statements on `separator`.
///
/// The separator is ignored inside single-quoted strings, double-quoted
/// identifiers, `--` line comments, and `/* ... */` block comments. Doubled
/// quotes (`''`, `""`) are treated as escapes. Comments are dropped, and
/// fragments that are empty after trimming are discarded. A trailing
/// statement without a separator is kept.
pub fn split_statements(sql: &str, separator: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    let mut in_single = false;
    let mut in_double = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
                current.push('\n');
            }
            continue;
        }
        if in_block_comment {
            if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if in_single {
            current.push(c);
            if c == '\'' {
                // Doubled quote is an escaped quote, not a terminator.
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                    current.push('\'');
                } else {
                    in_single = false;
                }
            }
            continue;
        }
        if in_double {
            current.push(c);
            if c == '"' {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                    current.push('"');
                } else {
                    in_double = false;
                }
            }
            continue;
        }

        // Outside any literal or comment.
        if !separator.is_empty() && sql[i..].starts_with(separator) {
            push_statement(&mut statements, &mut current);
            // Consume the remaining separator characters.
            for _ in 0..separator.chars().count() - 1 {
                chars.next();
            }
            continue;
        }

        match c {
            '\'' => {
                in_single = true;
                current.push(c);
            }
            '"' => {
                in_double = true;
                current.push(c);
            }
            '-' if sql[i..].starts_with("--") => {
                in_line_comment = true;
                chars.next();
            }
            '/' if sql[i..].starts_with("/*") => {
                in_block_comment = true;
                chars.next();
            }
            _ => current.push(c),
        }
    }

    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

/// Execute one (already filtered) SQL script.
///
/// Returns the number of statements attempted. With `continue_on_error`
/// every statement is attempted and failures are logged at warn level;
/// otherwise the first failure aborts the script.
pub fn run_script<E: SqlExecutor>(
    executor: &mut E,
    script_path: &Path,
    sql: &str,
    separator: &str,
    continue_on_error: bool,
) -> Result<usize> {
    let statements = split_statements(sql, separator);

    tracing::info!(
        script = %script_path.display(),
        statements = statements.len(),
        "Executing SQL script"
    );

    for (index, statement) in statements.iter().enumerate() {
        match executor.execute_statement(statement) {
            Ok(affected) => {
                tracing::debug!(
                    statement = index + 1,
                    rows_affected = affected,
                    "Statement executed"
                );
            }
            Err(e) => {
                if continue_on_error {
                    tracing::warn!(
                        script = %script_path.display(),
                        statement = index + 1,
                        error = %e,
                        "Statement failed, continuing"
                    );
                } else {
                    return Err(PreMigrateError::Execution {
                        script: script_path.to_path_buf(),
                        statement: index + 1,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    Ok(statements.len())
}
