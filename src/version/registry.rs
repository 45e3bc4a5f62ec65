//! Collaborator traits for the remote data sources

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::{Advisory, ModuleReplacement, PackageInfo};

/// Trait for fetching package metadata from a package registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches dist-tags and per-version metadata for a package
    ///
    /// # Arguments
    /// * `package_name` - Registry name of the package (e.g., "@types/node")
    ///
    /// # Returns
    /// * `Ok(PackageInfo)` - Snapshot of the package
    /// * `Err(RegistryError::NotFound)` - The registry does not know the package
    /// * `Err(RegistryError)` - Any other fetch failure
    async fn fetch_package_info(&self, package_name: &str) -> Result<PackageInfo, RegistryError>;
}

/// Trait for looking up community replacement advisories
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReplacementSource: Send + Sync {
    /// `Ok(None)` means the package has no advisory
    async fn fetch_replacement(
        &self,
        package_name: &str,
    ) -> Result<Option<ModuleReplacement>, RegistryError>;
}

/// Trait for querying known vulnerabilities of an exact version
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VulnerabilitySource: Send + Sync {
    async fn fetch_advisories(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Vec<Advisory>, RegistryError>;
}

/// Encode a package name for use in registry URLs
///
/// Scoped packages keep their `@` and escape the separator (`@scope/name` -> `@scope%2Fname`).
pub fn encode_package_name(package_name: &str) -> String {
    if package_name.starts_with('@') {
        package_name.replace('/', "%2F")
    } else {
        package_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("lodash", "lodash")]
    #[case("@types/node", "@types%2Fnode")]
    #[case("@vue/compiler-sfc", "@vue%2Fcompiler-sfc")]
    fn encode_package_name_returns_expected(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(encode_package_name(name), expected);
    }
}
