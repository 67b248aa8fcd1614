//! `${name}` / `${name:default}` placeholder substitution in SQL scripts.
//!
//! Scripts are "filtered through the environment" before execution: each
//! placeholder is replaced with a value from the layered [`PropertySource`].
//! Resolution is recursive — placeholders may appear inside default values,
//! inside resolved values, and inside placeholder names themselves — and
//! circular references are detected instead of recursing forever.

use std::collections::{HashMap, HashSet};

/// Placeholder prefix / suffix / default-value separator.
const PREFIX: &str = "${";
const SUFFIX: char = '}';
const VALUE_SEPARATOR: char = ':';

/// If the left-hand property has no value, the right-hand property is looked
/// up instead. Mirrors how migration tooling lets a script reference
/// `migration.schema` even when only the default schema is configured.
const FALLBACK_ALIASES: &[(&str, &str)] = &[("migration.schema", "migration.default-schema")];

/// Errors from placeholder substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstituteError {
    /// A placeholder had no value and no default.
    Unresolvable(String),
    /// Placeholders reference each other in a cycle.
    Circular(String),
}

impl std::fmt::Display for SubstituteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubstituteError::Unresolvable(name) => {
                write!(f, "could not resolve placeholder '{name}'")
            }
            SubstituteError::Circular(name) => {
                write!(f, "circular placeholder reference '{name}'")
            }
        }
    }
}

impl std::error::Error for SubstituteError {}

/// Layered lookup for placeholder values.
///
/// Explicit overrides win over process environment variables. Environment
/// lookup tries the literal property name first, then the conventional
/// relaxed form (`sql.script.schemaname` → `SQL_SCRIPT_SCHEMANAME`).
#[derive(Debug, Clone)]
pub struct PropertySource {
    overrides: HashMap<String, String>,
    use_env: bool,
}

impl Default for PropertySource {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertySource {
    /// Property source backed by the process environment only.
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            use_env: true,
        }
    }

    /// Property source with explicit overrides layered over the environment.
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self {
            overrides,
            use_env: true,
        }
    }

    /// Property source that never consults the environment. Useful for
    /// hermetic runs and tests.
    pub fn overrides_only(overrides: HashMap<String, String>) -> Self {
        Self {
            overrides,
            use_env: false,
        }
    }

    /// Add or replace a single override.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(name.into(), value.into());
    }

    /// Look up a property, applying the hardcoded fallback aliases.
    pub fn resolve(&self, name: &str) -> Option<String> {
        if let Some(val) = self.get(name) {
            return Some(val);
        }
        FALLBACK_ALIASES
            .iter()
            .find(|(from, _)| *from == name)
            .and_then(|(_, to)| self.get(to))
    }

    fn get(&self, name: &str) -> Option<String> {
        if let Some(val) = self.overrides.get(name) {
            return Some(val.clone());
        }
        if self.use_env {
            if let Ok(val) = std::env::var(name) {
                return Some(val);
            }
            let relaxed: String = name
                .chars()
                .map(|c| match c {
                    '.' | '-' => '_',
                    other => other.to_ascii_uppercase(),
                })
                .collect();
            if relaxed != name {
                if let Ok(val) = std::env::var(&relaxed) {
                    return Some(val);
                }
            }
        }
        None
    }
}

/// Replace every `${name}` / `${name:default}` in `text` with its resolved
/// value.
///
/// Text without placeholders passes through unchanged. A `${` without a
/// matching `}` is left as-is. An unresolvable placeholder (no value, no
/// default) or a circular reference is an error.
pub fn substitute(text: &str, props: &PropertySource) -> Result<String, SubstituteError> {
    if !text.contains(PREFIX) {
        return Ok(text.to_string());
    }
    let mut visited = HashSet::new();
    parse(text, props, &mut visited)
}

fn parse(
    text: &str,
    props: &PropertySource,
    visited: &mut HashSet<String>,
) -> Result<String, SubstituteError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(PREFIX) {
        out.push_str(&rest[..start]);
        let body_start = &rest[start + PREFIX.len()..];

        let Some(end) = find_closing_brace(body_start) else {
            // Unbalanced prefix: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let placeholder = &body_start[..end];
        if !visited.insert(placeholder.to_string()) {
            return Err(SubstituteError::Circular(placeholder.to_string()));
        }

        // Placeholders inside the placeholder body resolve first, so the name
        // itself may be computed (`${prefix.${suffix}}`).
        let body = parse(placeholder, props, visited)?;

        // The full body (default included) is tried as a property name before
        // splitting off the default value.
        let value = match props.resolve(&body) {
            Some(val) => Some(val),
            None => match body.split_once(VALUE_SEPARATOR) {
                Some((name, default)) => {
                    props.resolve(name).or_else(|| Some(default.to_string()))
                }
                None => None,
            },
        };

        match value {
            Some(val) => {
                // Resolved values may themselves contain placeholders.
                let replaced = parse(&val, props, visited)?;
                out.push_str(&replaced);
            }
            None => return Err(SubstituteError::Unresolvable(body)),
        }

        visited.remove(placeholder);
        rest = &body_start[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Index of the `}` matching the opening `${` that `body` directly follows,
/// skipping over nested `${ ... }` pairs.
///
/// Scans raw bytes: the delimiters are all ASCII, so they can never match
/// inside a multibyte character, and the returned index is always a char
/// boundary.
fn find_closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            depth += 1;
            i += 2;
        } else if bytes[i] == SUFFIX as u8 {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
            i += 1;
        } else {
            i += 1;
        }
    }
    None
}
