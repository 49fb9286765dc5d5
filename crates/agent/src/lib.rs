//! The Colloquy agent loop — a bounded reasoner⇄actor state machine.
//!
//! One run follows this cycle:
//!
//! 1. **Load** the thread's transcript from the checkpoint store (or start
//!    empty) and append the caller's query as a `Human` message
//! 2. **Reason**: send system instruction + tool catalogue + history to
//!    the oracle, append its single `AiResponse`
//! 3. **Route** on the latest message: tool invocations requested → act;
//!    otherwise → terminate
//! 4. **Act**: execute the requested invocations, append one `ToolResult`
//!    per request in request order, loop back to step 2
//! 5. **Persist** the transcript and return the last message's content
//!
//! A hard reasoning-step ceiling is the loop's sole liveness safeguard: an
//! oracle that requests tools forever gets a fatal error, with state
//! persisted up to that point.

pub mod loop_runner;
pub mod router;

pub mod test_support;

pub use loop_runner::AgentLoop;
pub use router::{Route, decide};
