//! Built-in tool implementations for Colloquy.
//!
//! The tool set is fixed at startup. One tool ships today: a similarity
//! search lookup against the document index.

pub mod lookup;

pub use lookup::LookupTool;

use colloquy_core::search::DocumentIndex;
use colloquy_core::tool::ToolRegistry;
use std::sync::Arc;

/// Create the default tool registry: a single employee-lookup tool over
/// the given document index.
pub fn default_registry(index: Arc<dyn DocumentIndex>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(LookupTool::employee_lookup(index)));
    registry
}
