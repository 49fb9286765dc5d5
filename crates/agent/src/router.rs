//! Routing decision after each reasoning step.
//!
//! A pure function over the latest message only. An `AiResponse` carrying
//! at least one tool invocation routes to the actor; everything else
//! terminates the loop and the latest message becomes the final answer.
//! A present-but-empty invocation list must terminate — malformed oracle
//! output is not allowed to spin the loop.

use colloquy_core::message::Message;

/// Where the loop goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Execute the requested tool invocations, then reason again.
    Act,
    /// Terminate; the latest message is the final answer.
    End,
}

/// Decide the next transition from the latest message.
pub fn decide(last: Option<&Message>) -> Route {
    match last {
        Some(Message::AiResponse { tool_calls, .. }) if !tool_calls.is_empty() => Route::Act,
        _ => Route::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::message::ToolInvocation;

    fn invocation() -> ToolInvocation {
        ToolInvocation {
            id: "call_1".into(),
            name: "employee_lookup".into(),
            arguments: r#"{"query":"Maria"}"#.into(),
        }
    }

    #[test]
    fn tool_calls_route_to_act() {
        let msg = Message::ai_with_tools("", vec![invocation()]);
        assert_eq!(decide(Some(&msg)), Route::Act);
    }

    #[test]
    fn plain_response_terminates() {
        let msg = Message::ai("FINAL ANSWER: two employees named Maria.");
        assert_eq!(decide(Some(&msg)), Route::End);
    }

    #[test]
    fn empty_tool_list_terminates() {
        // Present-but-empty must not loop.
        let msg = Message::ai_with_tools("thinking", vec![]);
        assert_eq!(decide(Some(&msg)), Route::End);
    }

    #[test]
    fn non_ai_messages_terminate() {
        assert_eq!(decide(Some(&Message::human("hi"))), Route::End);
        assert_eq!(
            decide(Some(&Message::tool_result("call_1", "lookup", "out"))),
            Route::End
        );
        assert_eq!(decide(None), Route::End);
    }
}
