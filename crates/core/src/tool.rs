//! Tool trait and registry — the abstraction over agent capabilities.
//!
//! The tool set is fixed at startup: tools are registered once in the
//! [`ToolRegistry`] and the registry validates every invocation against
//! the owning tool's declared JSON Schema before dispatch. Unknown names
//! and schema-invalid arguments are errors of the same severity — the
//! invocation fails, the registry does not.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id (matches the oracle's tool_call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The output of a successful tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The output serialized as text
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The core Tool trait.
///
/// Each tool implements this trait and is registered in the
/// [`ToolRegistry`], which makes it available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "employee_lookup").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the oracle).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with validated, normalized arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the oracle.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Validate `arguments` against a tool's JSON Schema and return the
/// normalized arguments.
///
/// Checks that required fields are present and that declared fields match
/// their declared primitive type; fills in declared `default` values for
/// absent optional fields. Extra fields pass through untouched.
pub fn validate_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> std::result::Result<serde_json::Value, ToolError> {
    let mut args = match arguments {
        serde_json::Value::Null => serde_json::Map::new(),
        serde_json::Value::Object(map) => map.clone(),
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "arguments must be an object, got {other}"
            )));
        }
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required field '{field}'"
                )));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(serde_json::Value::Object(args));
    };

    for (field, property) in properties {
        match args.get(field) {
            Some(value) => {
                if let Some(expected) = property.get("type").and_then(|t| t.as_str())
                    && !type_matches(expected, value)
                {
                    return Err(ToolError::InvalidArguments(format!(
                        "field '{field}' must be of type {expected}, got {value}"
                    )));
                }
            }
            None => {
                if let Some(default) = property.get("default") {
                    args.insert(field.clone(), default.clone());
                }
            }
        }
    }

    Ok(serde_json::Value::Object(args))
}

fn type_matches(expected: &str, value: &serde_json::Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the oracle
/// 2. Validate and execute invocations the oracle requests
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the oracle).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Validate and execute a tool call.
    ///
    /// The call's arguments are validated against the tool's schema before
    /// dispatch; validation failures and unknown names never reach the
    /// tool itself.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let arguments = validate_arguments(&tool.parameters_schema(), &call.arguments)?;
        tool.execute(arguments).await
    }

    /// List all registered tool names, sorted for stable prompt output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
