//! SQL script resolution.
//!
//! A reference list is interpreted one of two ways:
//!
//! 1. A single entry with a trailing slash (or naming an existing directory)
//!    is a *script folder*. From it, `<platform_code>.sql` is preferred and
//!    `default.sql` is the fallback; at most one of the two is selected. If
//!    neither exists the run is a no-op.
//! 2. Anything else is a list of explicit script files. All of them must
//!    exist (checked before anything executes) and all of them run, in list
//!    order.

use std::path::{Path, PathBuf};

use crate::error::{PreMigrateError, Result};

/// Resolve configured script references into concrete script paths.
///
/// `platform_code` is the effective platform code, already resolved from
/// configuration or auto-detection.
pub fn resolve_scripts(refs: &[String], platform_code: &str) -> Result<Vec<PathBuf>> {
    if refs.is_empty() {
        tracing::debug!("No script references configured");
        return Ok(Vec::new());
    }

    if refs.len() == 1 && is_folder_ref(&refs[0]) {
        return Ok(resolve_from_folder(Path::new(&refs[0]), platform_code));
    }

    // Explicit, specific script files. Validate existence of the whole list
    // up front so a bad reference never leaves a partial execution behind.
    let mut scripts = Vec::with_capacity(refs.len());
    for reference in refs {
        let path = PathBuf::from(reference);
        if !path.is_file() {
            return Err(PreMigrateError::ScriptRef(path));
        }
        scripts.push(path);
    }
    Ok(scripts)
}

/// A single reference is a folder reference if it ends with a path separator
/// or already exists as a directory.
fn is_folder_ref(reference: &str) -> bool {
    reference.ends_with('/') || reference.ends_with('\\') || Path::new(reference).is_dir()
}

/// Pick at most one script from a folder: `<platform_code>.sql` if present,
/// else `default.sql`, else nothing.
fn resolve_from_folder(folder: &Path, platform_code: &str) -> Vec<PathBuf> {
    let candidates = [
        folder.join(format!("{platform_code}.sql")),
        folder.join("default.sql"),
    ];

    for candidate in candidates {
        if candidate.is_file() {
            tracing::debug!(script = %candidate.display(), "Selected script from folder");
            return vec![candidate];
        }
    }

    tracing::debug!(
        folder = %folder.display(),
        platform_code,
        "No matching script in folder"
    );
    Vec::new()
}
