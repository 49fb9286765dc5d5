//! Message and thread-state domain types.
//!
//! These are the value objects that flow through the whole system: the
//! caller seeds a `Human` message, the reasoning oracle appends
//! `AiResponse` messages, and tool execution appends `ToolResult`
//! messages. The transcript is append-only — steps produce deltas and the
//! only mutation primitive is [`ThreadState::merge`], which concatenates
//! at the tail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque caller-supplied key identifying one logical conversation's
/// persisted state. Same id ⇒ same state lineage; nothing more is
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tool invocation requested by the oracle inside an [`Message::AiResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation id for this invocation (matches the oracle's tool_call id)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

/// A single message in a thread transcript.
///
/// Exactly three variants exist; the transcript is a sequence of these and
/// nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// A message from the end user.
    Human {
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// A reply from the reasoning oracle, optionally carrying tool
    /// invocation requests.
    AiResponse {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
        timestamp: DateTime<Utc>,
    },

    /// The outcome of one tool invocation, correlated back to the request
    /// that produced it.
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
        timestamp: DateTime<Utc>,
    },
}

impl Message {
    /// Create a new human message.
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an oracle reply with no tool invocations.
    pub fn ai(content: impl Into<String>) -> Self {
        Self::AiResponse {
            content: content.into(),
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create an oracle reply carrying tool invocation requests.
    pub fn ai_with_tools(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self::AiResponse {
            content: content.into(),
            tool_calls,
            timestamp: Utc::now(),
        }
    }

    /// Create a successful tool result message.
    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a tool result message carrying an in-band error payload.
    pub fn tool_error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error: true,
            timestamp: Utc::now(),
        }
    }

    /// The textual content of this message, regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            Self::Human { content, .. }
            | Self::AiResponse { content, .. }
            | Self::ToolResult { content, .. } => content,
        }
    }

    /// The tool invocations requested by this message. Empty for anything
    /// that is not an `AiResponse`.
    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            Self::AiResponse { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// The messages produced by a single step, to be appended to a thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDelta {
    pub messages: Vec<Message>,
}

impl StateDelta {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl From<Message> for StateDelta {
    fn from(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }
}

/// The full state of one conversation thread: an ordered, append-only
/// transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadState {
    /// Ordered messages
    pub messages: Vec<Message>,
}

impl ThreadState {
    /// Create a new empty thread state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a step's delta into this state by concatenation at the tail,
    /// preserving the delta's internal order. Pure and total — this is the
    /// only state-mutation primitive.
    #[must_use]
    pub fn merge(mut self, delta: StateDelta) -> Self {
        self.messages.extend(delta.messages);
        self
    }

    /// The most recently appended message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
