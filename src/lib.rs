//! # Tool Agent
//!
//! A minimal tool-calling agent for OpenAI-compatible chat models.
//!
//! This library provides:
//! - An [`Agent`] that owns a conversation transcript and a tool registry
//! - A tool-based loop that feeds tool output back to the model
//! - Rate-limit backoff around every model call
//! - An OpenAI-compatible HTTP client for the model provider
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Append the user message to the transcript
//! 2. Call the LLM with the transcript and the tool schemas
//! 3. Execute any requested tool calls, in order, and append their results
//! 4. Repeat until the LLM answers without requesting tools
//!
//! ## Example
//!
//! ```rust,ignore
//! use tool_agent::{Agent, Config, ToolRegistry};
//!
//! let config = Config::from_env()?;
//! let mut agent = Agent::from_config(&config, "Store Assistant", ToolRegistry::new(), None);
//! let answer = agent.invoke("What do you sell?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod telemetry;
pub mod tools;

pub use agent::{Agent, AgentError, AgentObserver, RetryPolicy, Transcript, TracingObserver};
pub use config::Config;
pub use llm::{ChatMessage, ChatResponse, LlmClient, LlmError, OpenAiClient, ToolCall};
pub use tools::{ArgumentShims, Invocable, InvocableTool, Tool, ToolRegistry};
