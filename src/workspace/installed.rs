//! Files inside installed packages under `node_modules`

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::fs::{FileSystem, find_nearest_file, is_node_modules};
use crate::config::PACKAGE_JSON_BASENAME;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstalledFileError {
    #[error("Selected file is not within a node_modules folder.")]
    NotInNodeModules,

    #[error("Could not find package.json for {0}")]
    ManifestNotFound(String),
}

/// A file located inside the package that ships it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledFile {
    pub name: String,
    pub version: String,
    /// Path of the file inside its package, `/`-separated
    pub relative_path: String,
}

#[derive(Deserialize)]
struct Manifest {
    name: Option<String>,
    version: Option<String>,
}

/// Find the package owning `file`: the nearest `package.json` above it that
/// does not lie beyond the enclosing `node_modules` directory.
pub async fn resolve_installed_file(
    fs: &dyn FileSystem,
    file: &Path,
) -> Result<InstalledFile, InstalledFileError> {
    if !file.components().any(|c| c.as_os_str() == "node_modules") {
        return Err(InstalledFileError::NotInNodeModules);
    }

    let not_found = || InstalledFileError::ManifestNotFound(file.display().to_string());

    let start = file.parent().ok_or_else(not_found)?;
    let manifest_path = find_nearest_file(fs, PACKAGE_JSON_BASENAME, start, is_node_modules)
        .await
        .ok_or_else(not_found)?;

    let text = fs.read_to_string(&manifest_path).await.map_err(|e| {
        warn!("Failed to read {}: {}", manifest_path.display(), e);
        not_found()
    })?;
    let manifest: Manifest = serde_json::from_str(&text).map_err(|e| {
        warn!("Invalid manifest {}: {}", manifest_path.display(), e);
        not_found()
    })?;

    let (Some(name), Some(version)) = (
        manifest.name.filter(|name| !name.is_empty()),
        manifest.version.filter(|version| !version.is_empty()),
    ) else {
        warn!("Manifest {} has no name or version", manifest_path.display());
        return Err(not_found());
    };

    let package_dir = manifest_path.parent().ok_or_else(not_found)?;
    let relative_path = file
        .strip_prefix(package_dir)
        .map_err(|_| not_found())?
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(InstalledFile {
        name,
        version,
        relative_path,
    })
}
