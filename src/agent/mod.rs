//! Agent module - the tool-calling agent loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user message to the transcript
//! 2. Call the LLM with the transcript and available tools
//! 3. If the LLM requests tool calls, execute them in order and append the results
//! 4. Repeat until the LLM produces a final response or the round limit is reached

mod agent_loop;
mod observer;
mod retry;
mod transcript;

pub use agent_loop::{Agent, AgentError};
pub use observer::{AgentObserver, NoopObserver, TracingObserver};
pub use retry::RetryPolicy;
pub use transcript::{Transcript, TranscriptError};
