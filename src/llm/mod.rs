//! LLM client interface and chat wire types.
//!
//! Messages serialize to the minimal OpenAI chat shape: `role` and `content`,
//! plus `tool_calls`, `name` and `tool_call_id` only where they apply.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod openai;

pub use openai::OpenAiClient;

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One transcript entry, tagged by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Result of one tool call, correlated by the request id.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: call.id.clone(),
            name: call.function.name.clone(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } | Self::Tool { content, .. } => {
                Some(content.as_str())
            }
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool calls requested by an assistant message (empty for other roles).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name plus the raw, unparsed argument payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Tool schema advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            tool_type: function_type(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

fn function_type() -> String {
    "function".to_string()
}

/// The assistant message returned by one model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    pub fn into_message(self) -> ChatMessage {
        ChatMessage::Assistant {
            content: self.content,
            tool_calls: self.tool_calls,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider signalled rate limiting (HTTP 429).
    #[error("Rate limited by LLM provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("LLM API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// LLM provider interface.
///
/// Implementations handle authentication, request formatting and response
/// parsing for a specific API.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the transcript and tool schemas, returning one assistant message.
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        temperature: f64,
    ) -> Result<ChatResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_assistant_omits_tool_fields() {
        let value = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn assistant_with_calls_serializes_openai_shape() {
        let msg = ChatResponse::with_tool_calls(vec![ToolCall::new("call_1", "GetStoreInfo", "{}")])
            .into_message();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "GetStoreInfo", "arguments": "{}"}
                }]
            })
        );
    }

    #[test]
    fn tool_result_carries_id_and_name() {
        let call = ToolCall::new("call_9", "lookup", "{\"q\":1}");
        let value = serde_json::to_value(ChatMessage::tool_result(&call, "done")).unwrap();
        assert_eq!(
            value,
            json!({"role": "tool", "tool_call_id": "call_9", "name": "lookup", "content": "done"})
        );
    }

    #[test]
    fn tool_call_type_defaults_when_absent() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "a",
            "function": {"name": "f"}
        }))
        .unwrap();
        assert_eq!(call.call_type, "function");
        assert_eq!(call.function.arguments, "");
    }

    #[test]
    fn accessors_follow_role() {
        let user = ChatMessage::user("question");
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.content(), Some("question"));
        assert!(user.tool_calls().is_empty());

        let pending = ChatResponse::with_tool_calls(vec![ToolCall::new("1", "t", "")]).into_message();
        assert_eq!(pending.role(), Role::Assistant);
        assert_eq!(pending.content(), None);
        assert_eq!(pending.tool_calls().len(), 1);
    }

    #[test]
    fn tool_definition_shape() {
        let def = ToolDefinition::function("echo", "Echo text", json!({"type": "object"}));
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!({
                "type": "function",
                "function": {"name": "echo", "description": "Echo text", "parameters": {"type": "object"}}
            })
        );
    }
}
