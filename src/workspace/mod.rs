//! Workspace file discovery, pnpm catalog resolution and installed packages

pub mod catalog;
pub mod fs;
pub mod installed;

pub use catalog::{CatalogDependencyResolution, CatalogManifest, CatalogResolver};
pub use fs::{FileSystem, LocalFileSystem};
pub use installed::{InstalledFile, InstalledFileError, resolve_installed_file};
