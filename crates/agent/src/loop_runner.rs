//! The agent loop implementation.

use crate::router::{Route, decide};
use chrono::Utc;
use colloquy_core::checkpoint::CheckpointStore;
use colloquy_core::error::{AgentError, Error};
use colloquy_core::message::{Message, StateDelta, ThreadId, ThreadState, ToolInvocation};
use colloquy_core::provider::{Provider, ProviderRequest};
use colloquy_core::tool::{ToolCall, ToolRegistry};
use futures::future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The core agent loop that orchestrates oracle calls and tool execution
/// for one thread at a time.
pub struct AgentLoop {
    /// The reasoning oracle
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature. 0 keeps tool-call decisions reproducible.
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Checkpoint store for thread resumability
    checkpoints: Arc<dyn CheckpointStore>,

    /// Persona line injected into the system instruction
    persona: String,

    /// Maximum reasoning steps per run (iteration ceiling)
    recursion_limit: u32,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            tools,
            checkpoints,
            persona: "You are a helpful HR Chatbot Agent.".into(),
            recursion_limit: 15,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per oracle response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the persona line of the system instruction.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Set the iteration ceiling (maximum reasoning steps per run).
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Run one query against a thread and return the final answer.
    ///
    /// The same thread id resumes the prior transcript; a fresh id starts
    /// an empty one. Fails if the oracle or a tool backend is unreachable,
    /// or if the ceiling is hit — in the latter case the transcript up to
    /// that point is persisted first so the next call can continue.
    pub async fn run(&self, query: &str, thread_id: &ThreadId) -> Result<String, Error> {
        let mut state = self
            .checkpoints
            .load(thread_id)
            .await?
            .unwrap_or_else(ThreadState::new);

        info!(
            thread = %thread_id,
            prior_messages = state.len(),
            "Agent run starting"
        );

        state = state.merge(StateDelta::from(Message::human(query)));

        let mut reasoning_steps = 0u32;
        loop {
            if reasoning_steps >= self.recursion_limit {
                warn!(
                    thread = %thread_id,
                    limit = self.recursion_limit,
                    "Iteration ceiling hit, aborting run"
                );
                self.checkpoints.save(thread_id, &state).await?;
                return Err(AgentError::RecursionLimitExceeded {
                    limit: self.recursion_limit,
                }
                .into());
            }
            reasoning_steps += 1;

            debug!(thread = %thread_id, step = reasoning_steps, "Reasoning step");
            let delta = self.reason(&state).await?;
            state = state.merge(delta);

            match decide(state.last_message()) {
                Route::End => break,
                Route::Act => {
                    let invocations = state
                        .last_message()
                        .map(|m| m.tool_calls().to_vec())
                        .unwrap_or_default();
                    debug!(
                        thread = %thread_id,
                        count = invocations.len(),
                        "Acting step"
                    );
                    state = state.merge(self.act(&invocations).await);
                }
            }
        }

        let answer = state
            .last_message()
            .map(|m| m.content().to_string())
            .ok_or(Error::Agent(AgentError::EmptyTranscript))?;

        self.checkpoints.save(thread_id, &state).await?;

        info!(
            thread = %thread_id,
            steps = reasoning_steps,
            messages = state.len(),
            "Agent run complete"
        );

        Ok(answer)
    }

    /// The fixed system instruction: collaborative-agent behavior, the
    /// FINAL ANSWER sentinel convention, the registered tool names, and
    /// the current time.
    fn system_instruction(&self) -> String {
        format!(
            "You are a helpful AI assistant, collaborating with other assistants. \
             Use the provided tools to progress towards answering the question. \
             If you are unable to fully answer, that's OK, another assistant with \
             different tools will help where you left off. Execute what you can to \
             make progress. If you or any of the other assistants have the final \
             answer or deliverable, prefix your response with FINAL ANSWER so the \
             team knows to stop. You have access to the following tools: {tools}.\n\
             {persona}\nCurrent time: {time}.",
            tools = self.tools.names().join(", "),
            persona = self.persona,
            time = Utc::now().to_rfc3339(),
        )
    }

    /// One reasoning step: invoke the oracle once over the full history
    /// and return its reply as the delta. Never edits history in place.
    async fn reason(&self, state: &ThreadState) -> Result<StateDelta, Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system: self.system_instruction(),
            messages: state.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };

        let response = self.provider.complete(request).await?;
        debug!(
            model = %response.model,
            tool_calls = response.message.tool_calls().len(),
            "Oracle replied"
        );

        Ok(StateDelta::from(response.message))
    }

    /// One acting step: execute every requested invocation and return one
    /// `ToolResult` per request, in request order.
    ///
    /// Invocations run concurrently — they are read-only and independent —
    /// but the ordered join keeps the delta in request order regardless of
    /// completion order. A failed invocation (unknown tool, invalid
    /// arguments, backend error) becomes an in-band error result instead
    /// of aborting the step, so the oracle can see and react to partial
    /// failure.
    async fn act(&self, invocations: &[ToolInvocation]) -> StateDelta {
        let results = future::join_all(invocations.iter().map(|inv| async move {
            let arguments =
                serde_json::from_str(&inv.arguments).unwrap_or(serde_json::Value::Null);
            let call = ToolCall {
                id: inv.id.clone(),
                name: inv.name.clone(),
                arguments,
            };

            match self.tools.execute(&call).await {
                Ok(output) => Message::tool_result(&inv.id, &inv.name, output.output),
                Err(e) => {
                    warn!(tool = %inv.name, error = %e, "Tool invocation failed");
                    Message::tool_error(&inv.id, &inv.name, format!("Error: {e}"))
                }
            }
        }))
        .await;

        StateDelta::new(results)
    }
}
