//! Version layer: specifier grammar, semver ordering and registry data
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │  Registries │────▶│  Memoized   │◀────│ PackageStore │
//! │ (npm, npmx, │     │ (ttl, dedup,│     │ (per-kind    │
//! │    osv)     │     │  stale)     │     │   caches)    │
//! └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`specifier`]: parse/format of dependency specifiers
//! - [`semver`]: ordering, prerelease ids and update classification
//! - [`registry`]: collaborator traits for remote sources
//! - [`registries`]: HTTP implementations of those traits
//! - [`memoize`]: TTL cache with in-flight de-duplication
//! - [`store`]: memoized access used by rules and providers
//! - [`types`]: `PackageInfo`, `ModuleReplacement`, `Advisory`
//! - [`error`]: registry error type

pub mod error;
pub mod memoize;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod specifier;
pub mod store;
pub mod types;
