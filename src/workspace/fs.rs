//! File-system access for locating and reading workspace files

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    async fn is_file(&self, path: &Path) -> bool;
}

/// Local disk through `tokio::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn is_file(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }
}

/// `start` and each of its ancestors up to the root.
///
/// The walk ends after yielding the first directory for which `should_stop`
/// returns true.
pub fn walk_ancestors<'a, F>(start: &'a Path, should_stop: F) -> impl Iterator<Item = &'a Path>
where
    F: Fn(&Path) -> bool + 'a,
{
    let mut stopped = false;
    start.ancestors().take_while(move |dir| {
        if stopped {
            return false;
        }
        stopped = should_stop(dir);
        true
    })
}

/// Nearest `file_name` in `start` or one of its ancestors
pub async fn find_nearest_file<F>(
    fs: &dyn FileSystem,
    file_name: &str,
    start: &Path,
    should_stop: F,
) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    for dir in walk_ancestors(start, should_stop) {
        let candidate = dir.join(file_name);
        if fs.is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Stop predicate for lookups that must not leave an installed package
pub fn is_node_modules(dir: &Path) -> bool {
    dir.file_name().is_some_and(|name| name == "node_modules")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn walk_ancestors_yields_every_parent() {
        let dirs: Vec<_> = walk_ancestors(Path::new("/a/b/c"), |_| false).collect();

        assert_eq!(
            dirs,
            vec![
                Path::new("/a/b/c"),
                Path::new("/a/b"),
                Path::new("/a"),
                Path::new("/")
            ]
        );
    }

    #[test]
    fn walk_ancestors_stops_after_matching_directory() {
        let dirs: Vec<_> =
            walk_ancestors(Path::new("/repo/node_modules/pkg/lib"), is_node_modules).collect();

        assert_eq!(
            dirs,
            vec![
                Path::new("/repo/node_modules/pkg/lib"),
                Path::new("/repo/node_modules/pkg"),
                Path::new("/repo/node_modules"),
            ]
        );
    }

    #[test]
    fn walk_ancestors_is_restartable() {
        let start = Path::new("/x/y");
        let first: Vec<_> = walk_ancestors(start, |_| false).collect();
        let second: Vec<_> = walk_ancestors(start, |_| false).collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn find_nearest_file_returns_closest_match() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("packages/app/src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("pnpm-workspace.yaml"), "").unwrap();
        std::fs::write(temp.path().join("packages/pnpm-workspace.yaml"), "").unwrap();

        let found =
            find_nearest_file(&LocalFileSystem, "pnpm-workspace.yaml", &nested, |_| false).await;

        assert_eq!(found, Some(temp.path().join("packages/pnpm-workspace.yaml")));
    }

    #[tokio::test]
    async fn find_nearest_file_respects_stop_predicate() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("node_modules/pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();

        let found = find_nearest_file(&LocalFileSystem, "package.json", &nested, is_node_modules).await;

        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn find_nearest_file_ignores_directories_with_the_same_name() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a");
        std::fs::create_dir_all(nested.join("pnpm-workspace.yaml")).unwrap();

        let found =
            find_nearest_file(&LocalFileSystem, "pnpm-workspace.yaml", &nested, |_| false).await;

        assert_eq!(found, None);
    }
}
