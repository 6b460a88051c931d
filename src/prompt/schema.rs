use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_FILE_NAME: &str = "options.schema.json";
pub const SHARED_SCHEMA_DIR: &str = "/usr/local/share/insta-assist";
const TEMP_SCHEMA_FILE_NAME: &str = "instassist-options.schema.json";

/// JSON Schema for the `{"options":[...]}` reply, handed to backends that accept one.
pub const OPTIONS_SCHEMA: &str = include_str!("assets/options.schema.json");

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to write fallback schema {path}: {source}")]
    WriteFallback {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn schema_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(SCHEMA_FILE_NAME));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(SCHEMA_FILE_NAME));
    }
    paths.push(PathBuf::from(SHARED_SCHEMA_DIR).join(SCHEMA_FILE_NAME));
    paths
}

/// Returns the first installed schema file, or writes the embedded schema to the
/// temp directory when none is installed.
pub fn resolve_schema_path() -> Result<PathBuf, SchemaError> {
    resolve_schema_path_in(&schema_search_paths(), &std::env::temp_dir())
}

pub fn resolve_schema_path_in(
    candidates: &[PathBuf],
    temp_dir: &Path,
) -> Result<PathBuf, SchemaError> {
    if let Some(found) = candidates.iter().find(|path| path.is_file()) {
        return Ok(found.clone());
    }

    let fallback = temp_dir.join(TEMP_SCHEMA_FILE_NAME);
    write_fallback(&fallback).map_err(|source| SchemaError::WriteFallback {
        path: fallback.display().to_string(),
        source,
    })?;
    Ok(fallback)
}

// Several sessions may start at once; each writes its own temp file and renames it
// over the shared path.
fn write_fallback(path: &Path) -> std::io::Result<()> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == OPTIONS_SCHEMA) {
        return Ok(());
    }
    let staging = path.with_extension(format!("json.{}", std::process::id()));
    fs::write(&staging, OPTIONS_SCHEMA)?;
    fs::rename(&staging, path)
}
