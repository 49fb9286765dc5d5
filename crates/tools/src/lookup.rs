//! Similarity-search lookup tool.
//!
//! Accepts `{query: string, n: integer (default 10)}` and performs a
//! semantic search against the document index, scoped to one collection
//! and one named index. Results come back as the top-n matches with
//! similarity scores, serialized as JSON text for the oracle to read.
//! Backend failures propagate as tool-execution failures — no retries
//! here.

use async_trait::async_trait;
use colloquy_core::error::ToolError;
use colloquy_core::search::{DocumentIndex, SearchRequest};
use colloquy_core::tool::{Tool, ToolOutput};
use std::sync::Arc;
use tracing::debug;

/// A lookup tool bound to one (collection, index) scope of a document
/// index.
pub struct LookupTool {
    index: Arc<dyn DocumentIndex>,
    name: String,
    description: String,
    collection: String,
    index_name: String,
}

impl LookupTool {
    /// Create a lookup tool with an explicit identity and scope.
    pub fn new(
        index: Arc<dyn DocumentIndex>,
        name: impl Into<String>,
        description: impl Into<String>,
        collection: impl Into<String>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            description: description.into(),
            collection: collection.into(),
            index_name: index_name.into(),
        }
    }

    /// The HR employee lookup (convenience constructor with the stock
    /// identity and scope).
    pub fn employee_lookup(index: Arc<dyn DocumentIndex>) -> Self {
        Self::new(
            index,
            "employee_lookup",
            "Gathers employee details from the HR database",
            "employees",
            "vector_index",
        )
    }
}

#[async_trait]
impl Tool for LookupTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "n": {
                    "type": "integer",
                    "description": "Number of results to return",
                    "default": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let n = arguments["n"].as_u64().unwrap_or(10) as usize;

        debug!(tool = %self.name, query, n, "Lookup tool called");

        let hits = self
            .index
            .similarity_search(SearchRequest {
                collection: self.collection.clone(),
                index: self.index_name.clone(),
                query: query.to_string(),
                limit: n,
            })
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;

        let data = serde_json::to_value(&hits).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: format!("result serialization: {e}"),
        })?;

        Ok(ToolOutput {
            output: data.to_string(),
            data: Some(data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::search::Document;
    use colloquy_core::tool::{ToolCall, ToolRegistry};
    use colloquy_store::InMemoryDocumentIndex;

    async fn seeded_index() -> Arc<InMemoryDocumentIndex> {
        let index = Arc::new(InMemoryDocumentIndex::new());
        index
            .insert(
                "employees",
                "vector_index",
                Document {
                    id: "emp_001".into(),
                    content: "Maria Santos, HR generalist, Lisbon office".into(),
                    metadata: serde_json::Map::new(),
                },
            )
            .await;
        index
            .insert(
                "employees",
                "vector_index",
                Document {
                    id: "emp_002".into(),
                    content: "Maria Chen, payroll specialist".into(),
                    metadata: serde_json::Map::new(),
                },
            )
            .await;
        index
            .insert(
                "employees",
                "vector_index",
                Document {
                    id: "emp_003".into(),
                    content: "John Doe, accountant".into(),
                    metadata: serde_json::Map::new(),
                },
            )
            .await;
        index
    }

    #[tokio::test]
    async fn lookup_returns_serialized_hits() {
        let tool = LookupTool::employee_lookup(seeded_index().await);
        let result = tool
            .execute(serde_json::json!({"query": "Maria", "n": 10}))
            .await
            .unwrap();

        assert!(result.output.contains("Maria Santos"));
        assert!(result.output.contains("Maria Chen"));
        assert!(!result.output.contains("John Doe"));
        assert!(result.output.contains("score"));

        let hits: Vec<serde_json::Value> =
            serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn lookup_respects_n() {
        let tool = LookupTool::employee_lookup(seeded_index().await);
        let result = tool
            .execute(serde_json::json!({"query": "Maria", "n": 1}))
            .await
            .unwrap();

        let hits: Vec<serde_json::Value> =
            serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn missing_query_returns_error() {
        let tool = LookupTool::employee_lookup(seeded_index().await);
        let result = tool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[tokio::test]
    async fn registry_applies_schema_default_for_n() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool::employee_lookup(seeded_index().await)));

        // Registry validation fills n = 10 from the schema default.
        let result = registry
            .execute(&ToolCall {
                id: "call_1".into(),
                name: "employee_lookup".into(),
                arguments: serde_json::json!({"query": "Maria"}),
            })
            .await
            .unwrap();

        let hits: Vec<serde_json::Value> =
            serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn default_registry_has_employee_lookup() {
        let registry = crate::default_registry(seeded_index().await);
        assert!(registry.get("employee_lookup").is_some());
        assert_eq!(registry.names(), vec!["employee_lookup"]);
    }

    #[test]
    fn tool_definition() {
        let tool = LookupTool::employee_lookup(Arc::new(InMemoryDocumentIndex::new()));
        let def = tool.to_definition();
        assert_eq!(def.name, "employee_lookup");
        assert_eq!(def.parameters["properties"]["n"]["default"], 10);
    }
}
