//! Scripted providers and builders for loop tests.
//!
//! Kept as a public module so integration tests (and downstream crates)
//! can drive the loop without a live oracle.

use colloquy_core::error::ProviderError;
use colloquy_core::message::{Message, ToolInvocation};
use colloquy_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request it was given. Panics if more calls are made than
/// responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![text_response(text)])
    }

    /// A provider that first requests tools, then gives a final answer.
    pub fn tool_then_answer(
        invocations: Vec<ToolInvocation>,
        thought: &str,
        answer: &str,
    ) -> Self {
        Self::new(vec![
            tool_call_response(invocations, thought),
            text_response(answer),
        ])
    }

    /// Number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The nth request this provider received.
    pub fn request(&self, n: usize) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().get(n).cloned()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        let index = requests.len();
        if index >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                index,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[index].clone())
    }
}

/// Create a simple text response (no tool calls).
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::ai(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response carrying tool invocations and optional thought text.
pub fn tool_call_response(invocations: Vec<ToolInvocation>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::ai_with_tools(thought, invocations),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool invocation with an id derived from the name.
pub fn invocation(name: &str, args: serde_json::Value) -> ToolInvocation {
    invocation_with_id(&format!("call_{name}"), name, args)
}

/// Helper to create a tool invocation with an explicit id.
pub fn invocation_with_id(id: &str, name: &str, args: serde_json::Value) -> ToolInvocation {
    ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}
