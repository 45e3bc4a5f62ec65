pub mod config;
pub mod links;
pub mod lsp;
pub mod parser;
pub mod version;
pub mod workspace;
