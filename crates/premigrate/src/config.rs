//! Pipeline configuration loaded from environment variables.
//!
//! All settings have defaults so the pipeline can run with zero configuration:
//! scripts are looked up in a `premigrate/` folder next to the working
//! directory, the platform code is auto-detected, and statements are split on
//! semicolons.

use std::borrow::Cow;
use std::str::FromStr;

use serde::Deserialize;

/// Character encoding used when reading SQL script files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptEncoding {
    /// Strict UTF-8. Invalid byte sequences are an error.
    Utf8,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    Utf8Lossy,
    /// ISO-8859-1, every byte maps to the code point of the same value.
    Latin1,
}

impl ScriptEncoding {
    /// Decode raw script bytes according to the selected encoding.
    ///
    /// Only [`ScriptEncoding::Utf8`] can fail; the other encodings accept any
    /// byte sequence.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, std::str::Utf8Error> {
        match self {
            ScriptEncoding::Utf8 => std::str::from_utf8(bytes).map(Cow::Borrowed),
            ScriptEncoding::Utf8Lossy => Ok(String::from_utf8_lossy(bytes)),
            ScriptEncoding::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
        }
    }
}

impl FromStr for ScriptEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(ScriptEncoding::Utf8),
            "utf8-lossy" | "utf-8-lossy" => Ok(ScriptEncoding::Utf8Lossy),
            "latin1" | "iso-8859-1" => Ok(ScriptEncoding::Latin1),
            other => Err(format!("unknown script encoding: {other}")),
        }
    }
}

impl std::fmt::Display for ScriptEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScriptEncoding::Utf8 => "utf-8",
            ScriptEncoding::Utf8Lossy => "utf-8-lossy",
            ScriptEncoding::Latin1 => "latin1",
        };
        f.write_str(name)
    }
}

/// Configuration for a premigrate run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PreMigrateConfig {
    /// Whether the pipeline runs at all.
    /// Env: `PREMIGRATE_ENABLED`
    /// Default: `true`
    pub enabled: bool,

    /// Database platform code used when choosing which SQL script to execute
    /// (as in `premigrate/<code>.sql`). When unset the platform is
    /// auto-detected from the database itself.
    /// Env: `PREMIGRATE_DB_PLATFORM_CODE`
    /// Default: unset (auto-detect)
    pub db_platform_code: Option<String>,

    /// Script references. Either a single folder reference (trailing slash,
    /// or an existing directory) from which `<platform>.sql` / `default.sql`
    /// is picked, or a list of explicit script files executed in order.
    /// Env: `PREMIGRATE_SQL_SCRIPT_REFS` (comma-separated)
    /// Default: `["premigrate/"]`
    pub sql_script_refs: Vec<String>,

    /// Whether to keep executing remaining statements after one fails.
    /// Env: `PREMIGRATE_CONTINUE_ON_ERROR` (true/false)
    /// Default: `false`
    pub continue_on_error: bool,

    /// Statement separator in SQL scripts.
    /// Env: `PREMIGRATE_SEPARATOR`
    /// Default: `";"`
    pub separator: String,

    /// File encoding for SQL scripts.
    /// Env: `PREMIGRATE_SQL_SCRIPT_ENCODING`
    /// Default: `utf-8`
    pub sql_script_encoding: ScriptEncoding,
}

/// Default folder searched for scripts when no references are configured.
pub const DEFAULT_SCRIPT_FOLDER: &str = "premigrate/";

impl Default for PreMigrateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_platform_code: None,
            sql_script_refs: vec![DEFAULT_SCRIPT_FOLDER.to_string()],
            continue_on_error: false,
            separator: ";".to_string(),
            sql_script_encoding: ScriptEncoding::Utf8,
        }
    }
}

impl PreMigrateConfig {
    /// Load configuration from `PREMIGRATE_*` environment variables, falling
    /// back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PREMIGRATE_ENABLED") {
            config.enabled = val != "false" && val != "0";
        }

        if let Ok(code) = std::env::var("PREMIGRATE_DB_PLATFORM_CODE") {
            if !code.is_empty() {
                config.db_platform_code = Some(code);
            }
        }

        if let Ok(refs) = std::env::var("PREMIGRATE_SQL_SCRIPT_REFS") {
            config.sql_script_refs = refs
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(val) = std::env::var("PREMIGRATE_CONTINUE_ON_ERROR") {
            config.continue_on_error = val != "false" && val != "0";
        }

        if let Ok(sep) = std::env::var("PREMIGRATE_SEPARATOR") {
            if !sep.is_empty() {
                config.separator = sep;
            }
        }

        if let Ok(enc) = std::env::var("PREMIGRATE_SQL_SCRIPT_ENCODING") {
            match enc.parse::<ScriptEncoding>() {
                Ok(parsed) => config.sql_script_encoding = parsed,
                Err(e) => {
                    tracing::warn!(
                        value = %enc,
                        error = %e,
                        "Invalid PREMIGRATE_SQL_SCRIPT_ENCODING, using default"
                    );
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreMigrateConfig::default();
        assert!(config.enabled);
        assert!(config.db_platform_code.is_none());
        assert_eq!(config.sql_script_refs, vec!["premigrate/".to_string()]);
        assert!(!config.continue_on_error);
        assert_eq!(config.separator, ";");
        assert_eq!(config.sql_script_encoding, ScriptEncoding::Utf8);
    }

    #[test]
    fn test_from_env_overrides_and_keeps_default_on_bad_value() {
        // These variable names are only read here; no other test touches them.
        std::env::set_var("PREMIGRATE_ENABLED", "false");
        std::env::set_var("PREMIGRATE_DB_PLATFORM_CODE", "h2");
        std::env::set_var("PREMIGRATE_SQL_SCRIPT_REFS", "a.sql, b.sql");
        std::env::set_var("PREMIGRATE_CONTINUE_ON_ERROR", "true");
        std::env::set_var("PREMIGRATE_SEPARATOR", ";;");
        std::env::set_var("PREMIGRATE_SQL_SCRIPT_ENCODING", "ebcdic");

        let config = PreMigrateConfig::from_env();

        assert!(!config.enabled);
        assert_eq!(config.db_platform_code.as_deref(), Some("h2"));
        assert_eq!(
            config.sql_script_refs,
            vec!["a.sql".to_string(), "b.sql".to_string()]
        );
        assert!(config.continue_on_error);
        assert_eq!(config.separator, ";;");
        // Unknown encoding keeps the default.
        assert_eq!(config.sql_script_encoding, ScriptEncoding::Utf8);

        std::env::remove_var("PREMIGRATE_ENABLED");
        std::env::remove_var("PREMIGRATE_DB_PLATFORM_CODE");
        std::env::remove_var("PREMIGRATE_SQL_SCRIPT_REFS");
        std::env::remove_var("PREMIGRATE_CONTINUE_ON_ERROR");
        std::env::remove_var("PREMIGRATE_SEPARATOR");
        std::env::remove_var("PREMIGRATE_SQL_SCRIPT_ENCODING");
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("utf-8".parse::<ScriptEncoding>(), Ok(ScriptEncoding::Utf8));
        assert_eq!("UTF8".parse::<ScriptEncoding>(), Ok(ScriptEncoding::Utf8));
        assert_eq!(
            "iso-8859-1".parse::<ScriptEncoding>(),
            Ok(ScriptEncoding::Latin1)
        );
        assert!("ebcdic".parse::<ScriptEncoding>().is_err());
    }

    #[test]
    fn test_decode_utf8_strict() {
        assert_eq!(
            ScriptEncoding::Utf8.decode(b"SELECT 1;").unwrap(),
            "SELECT 1;"
        );
        assert!(ScriptEncoding::Utf8.decode(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_decode_latin1() {
        // 0xE9 is é in ISO-8859-1
        let decoded = ScriptEncoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: PreMigrateConfig = serde_json::from_str(
            r#"{ "continue-on-error": true, "sql-script-encoding": "latin1" }"#,
        )
        .unwrap();
        assert!(config.enabled);
        assert!(config.continue_on_error);
        assert_eq!(config.sql_script_encoding, ScriptEncoding::Latin1);
        assert_eq!(config.separator, ";");
    }
}
