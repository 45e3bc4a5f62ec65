//! HTTP clients for the registry, replacement and vulnerability sources

pub mod npm;
pub mod osv;
pub mod replacement;

pub use npm::NpmRegistry;
pub use osv::OsvClient;
pub use replacement::NpmxReplacementSource;
