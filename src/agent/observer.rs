//! Observation hooks called by the agent loop.

use std::time::Duration;

use crate::tools::ToolArgs;

/// Receives notifications at fixed points of the agent loop.
///
/// Every method has an empty default, so implementors only override what
/// they care about.
pub trait AgentObserver: Send + Sync {
    fn on_invoke(&self, _agent: &str, _message: &str) {}

    /// A model call is about to be made. `round` counts tool rounds already run.
    fn on_model_call(&self, _agent: &str, _round: usize) {}

    fn on_tool_start(&self, _agent: &str, _tool: &str, _args: &ToolArgs) {}

    fn on_tool_finish(&self, _agent: &str, _tool: &str, _output: &str, _failed: bool) {}

    /// The provider rate limited attempt `attempt` (1-based) of `max_attempts`.
    fn on_rate_limited(&self, _agent: &str, _attempt: u32, _max_attempts: u32, _delay: Duration) {}

    fn on_retries_exhausted(&self, _agent: &str, _attempts: u32) {}

    fn on_depth_limit(&self, _agent: &str, _limit: usize) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AgentObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AgentObserver for TracingObserver {
    fn on_invoke(&self, agent: &str, message: &str) {
        tracing::info!(agent, message = %truncate_for_log(message, 200), "Calling agent");
    }

    fn on_model_call(&self, agent: &str, round: usize) {
        tracing::debug!(agent, "Agent iteration {}", round + 1);
    }

    fn on_tool_start(&self, agent: &str, tool: &str, args: &ToolArgs) {
        tracing::info!(
            agent,
            tool,
            args = %serde_json::Value::Object(args.clone()),
            "Calling tool"
        );
    }

    fn on_tool_finish(&self, agent: &str, tool: &str, output: &str, failed: bool) {
        if failed {
            tracing::warn!(agent, tool, error = %output, "Tool failed");
        } else {
            tracing::debug!(agent, tool, output = %truncate_for_log(output, 1000), "Tool finished");
        }
    }

    fn on_rate_limited(&self, agent: &str, attempt: u32, max_attempts: u32, delay: Duration) {
        if attempt < max_attempts {
            tracing::warn!(
                agent,
                attempt,
                max_attempts,
                delay_secs = delay.as_secs_f64(),
                "Rate limit reached, waiting before retry"
            );
        } else {
            tracing::warn!(agent, attempt, max_attempts, "Rate limit reached on final attempt");
        }
    }

    fn on_retries_exhausted(&self, agent: &str, attempts: u32) {
        tracing::error!(agent, attempts, "Max retries reached, giving up");
    }

    fn on_depth_limit(&self, agent: &str, limit: usize) {
        tracing::warn!(agent, limit, "Tool call round limit reached");
    }
}

/// Truncate a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
