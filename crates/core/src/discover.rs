use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{CleanError, CleanResult};
use crate::settings::Settings;

pub const MARKER_FILES: &[&str] = &[".gitignore", ".keep"];

const LOGS_SEGMENT: &str = "logs";

pub fn discover_candidate_files(
    settings: &Settings,
    all_files: bool,
) -> CleanResult<Vec<PathBuf>> {
    let root = resolve_output_root(settings)?;
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut result = Vec::new();
    for item in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let failed = err.path().unwrap_or(root.as_path()).display().to_string();
                warn!("skipping unreadable entry {failed}: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if MARKER_FILES.iter().any(|marker| name == *marker) {
            continue;
        }
        if !all_files && is_under_logs(entry.path()) && name.contains(settings.log_marker.as_str())
        {
            continue;
        }

        result.push(entry.into_path());
    }

    Ok(result)
}

pub fn resolve_output_root(settings: &Settings) -> CleanResult<PathBuf> {
    let root = settings.output_root();
    if root.is_absolute() {
        return Ok(root);
    }
    let cwd = env::current_dir().map_err(|source| CleanError::CurrentDir { source })?;
    Ok(absolutize(&cwd, &root))
}

fn absolutize(base: &Path, relative: &Path) -> PathBuf {
    base.join(relative)
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

pub fn discover_database_files(settings: &Settings) -> Vec<PathBuf> {
    if settings.db_type.is_relational() {
        return Vec::new();
    }

    let files = &settings.default_files;
    [
        &files.dir_structure,
        &files.iana,
        &files.public_suffix,
        &files.inactive_db,
        &files.mining,
    ]
    .into_iter()
    .map(|name| settings.config_directory.join(name))
    .collect()
}

/// Removes `path`. Returns `Ok(false)` when there was nothing to remove.
pub fn delete_file(path: &Path) -> CleanResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CleanError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn is_under_logs(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    parent
        .components()
        .any(|component| matches!(component, Component::Normal(name) if name == LOGS_SEGMENT))
}
