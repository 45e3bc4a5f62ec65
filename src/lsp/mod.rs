//! LSP (Language Server Protocol) implementation layer
//!
//! This module handles communication with editors via LSP and turns the
//! dependencies of open manifests into diagnostics and editor features.
//!
//! # Modules
//!
//! - [`backend`]: Main LSP backend implementing `LanguageServer` trait
//! - [`diagnostics`]: Debounced per-document diagnostic collection
//! - [`rules`]: Individual diagnostic rules (upgrade, deprecation, ...)
//! - [`resolver`]: Effective specifier of a dependency, following catalogs
//! - [`hover`], [`completion`], [`code_lens`], [`code_action`],
//!   [`document_link`]: editor features built on the extractors
//! - [`commands`]: `workspace/executeCommand` handlers' argument decoding
//! - [`server`]: LSP server initialization and lifecycle

pub mod backend;
pub mod code_action;
pub mod code_lens;
pub mod commands;
pub mod completion;
pub mod diagnostics;
pub mod document_link;
pub mod hover;
pub mod resolver;
pub mod rules;
pub mod server;
