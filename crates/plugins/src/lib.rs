//! Built-in plugin implementations for LibreAssistant.
//!
//! Plugins give the model capabilities beyond text generation: searching
//! the web, looking up court opinions, and reading/writing files inside a
//! sandbox directory. Each one implements the `Plugin` contract from
//! `libreassistant-core` and is registered once at startup; the built
//! registry is immutable for the process lifetime.

pub mod case_law;
pub mod file_io;
pub mod web_search;

use std::path::PathBuf;
use std::sync::Arc;

use libreassistant_core::{PluginRegistry, PluginRegistryBuilder};

/// Create the default registry with all built-in plugins.
///
/// `file_root` is the sandbox directory the file-io plugin is confined
/// to; paths outside it are rejected.
pub fn default_registry(file_root: impl Into<PathBuf>) -> PluginRegistry {
    PluginRegistryBuilder::new()
        .register(Arc::new(web_search::WebSearchPlugin))
        .register(Arc::new(case_law::CaseLawPlugin))
        .register(Arc::new(file_io::FileIoPlugin::new(file_root)))
        .build()
}
