//! Tool registry: the fixed catalog of tools offered to the model.
//!
//! Built once at startup and read-only afterwards. The executor resolves
//! and validates calls through it.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use toolloop_core::error::ToolError;
use toolloop_core::types::ToolDefinition;
use tracing::{info, warn};

use super::base::{Tool, ToolArgs};
use super::schema;

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Stores tools keyed by name.
///
/// Owns `Arc<dyn Tool>` so tools can be handed to spawned tasks.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        info!(tool = tool.name(), "registered tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of all registered tools, sorted for determinism.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Model-facing definitions for all registered tools, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Resolve `name` and check `arguments` against its schema.
    ///
    /// Returns the tool and its argument object, ready for `execute`.
    pub fn validate(
        &self,
        name: &str,
        arguments: &Value,
    ) -> Result<(Arc<dyn Tool>, ToolArgs), ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| {
            warn!(tool = name, "tool not found");
            ToolError::NotFound(name.to_string())
        })?;

        let Some(args) = arguments.as_object() else {
            warn!(tool = name, "tool arguments are not a JSON object");
            return Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got: {}",
                arguments
            )));
        };

        schema::validate(arguments, &tool.parameters()).map_err(|errors| {
            warn!(tool = name, errors = ?errors, "tool arguments rejected");
            ToolError::InvalidArguments(errors.join("; "))
        })?;

        Ok((Arc::clone(tool), args.clone()))
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
