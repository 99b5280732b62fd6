//! Core agent loop implementation.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_TEMPERATURE};
use crate::llm::{ChatMessage, ChatResponse, LlmClient, LlmError, OpenAiClient, ToolCall, ToolDefinition};
use crate::tools::{parse_arguments, ArgumentShims, ToolArgs, ToolRegistry};

use super::observer::{AgentObserver, TracingObserver};
use super::retry::RetryPolicy;
use super::transcript::Transcript;

/// Errors that abort an [`Agent::invoke`] call.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Rate limited by LLM provider after {attempts} attempts")]
    RateLimited {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// A tool-calling agent with its own conversation transcript.
pub struct Agent {
    name: String,
    model: String,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    tool_schemas: Vec<ToolDefinition>,
    shims: ArgumentShims,
    observer: Arc<dyn AgentObserver>,
    retry: RetryPolicy,
    temperature: f64,
    max_tool_rounds: usize,
    transcript: Transcript,
}

impl Agent {
    /// Create a new agent. No network calls are made.
    ///
    /// A non-empty `system_prompt` becomes the first transcript message.
    /// Arguments are remapped with [`ArgumentShims::storefront`] unless
    /// replaced with [`with_shims`](Self::with_shims).
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        system_prompt: Option<String>,
    ) -> Self {
        let tool_schemas = tools.get_tool_schemas();

        Self {
            name: name.into(),
            model: model.into(),
            llm,
            tools,
            tool_schemas,
            shims: ArgumentShims::storefront(),
            observer: Arc::new(TracingObserver),
            retry: RetryPolicy::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            transcript: Transcript::new(system_prompt),
        }
    }

    /// Create an agent talking to the OpenAI-compatible endpoint in `config`.
    pub fn from_config(
        config: &Config,
        name: impl Into<String>,
        tools: ToolRegistry,
        system_prompt: Option<String>,
    ) -> Self {
        let llm = Arc::new(OpenAiClient::new(config.api_key.clone()).with_base_url(&config.base_url));

        Self::new(name, config.default_model.clone(), llm, tools, system_prompt)
            .with_temperature(config.temperature)
            .with_retry_policy(config.retry)
            .with_max_tool_rounds(config.max_tool_rounds)
    }

    pub fn with_observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_shims(mut self, shims: ArgumentShims) -> Self {
        self.shims = shims;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Maximum tool call rounds per [`invoke`](Self::invoke).
    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Send a user message and run the agent loop until the model answers
    /// without requesting tools.
    pub async fn invoke(&mut self, message: &str) -> Result<String, AgentError> {
        self.observer.on_invoke(&self.name, message);
        self.transcript.push(ChatMessage::user(message));

        let mut rounds = 0;
        loop {
            self.observer.on_model_call(&self.name, rounds);
            let response = self.call_llm().await?;

            if response.tool_calls.is_empty() {
                return Ok(response.content.unwrap_or_default());
            }

            if rounds >= self.max_tool_rounds {
                return Ok(self.stop_at_round_limit(&response.tool_calls));
            }

            for tool_call in &response.tool_calls {
                let output = self.execute_tool_call(tool_call).await;
                self.transcript.push(ChatMessage::tool_result(tool_call, output));
            }

            rounds += 1;
        }
    }

    /// Clear the conversation, keeping the system prompt.
    pub fn reset(&mut self) {
        self.transcript.reset();
    }

    /// Call the model, retrying with backoff while rate limited.
    ///
    /// The returned assistant message is appended to the transcript.
    async fn call_llm(&mut self) -> Result<ChatResponse, AgentError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let tools = (!self.tool_schemas.is_empty()).then_some(self.tool_schemas.as_slice());

        let mut attempt = 0;
        loop {
            let result = self
                .llm
                .chat_completion(&self.model, self.transcript.messages(), tools, self.temperature)
                .await;

            match result {
                Ok(response) => {
                    self.transcript.push(response.clone().into_message());
                    return Ok(response);
                }
                Err(err) if err.is_rate_limited() => {
                    let delay = self.retry.delay_for(attempt);
                    self.observer
                        .on_rate_limited(&self.name, attempt + 1, max_attempts, delay);

                    if attempt + 1 >= max_attempts {
                        self.observer.on_retries_exhausted(&self.name, max_attempts);
                        return Err(AgentError::RateLimited {
                            attempts: max_attempts,
                            source: err,
                        });
                    }

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Execute a single tool call, returning the text the model will see.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> String {
        let tool_name = tool_call.function.name.as_str();
        let args = self
            .shims
            .resolve(tool_name, parse_arguments(&tool_call.function.arguments));

        self.observer.on_tool_start(&self.name, tool_name, &args);

        let (output, failed) = match self.run_tool(tool_name, args).await {
            Ok(output) => (output, false),
            Err(e) => (format!("Error: {}", e), true),
        };

        self.observer
            .on_tool_finish(&self.name, tool_name, &output, failed);
        output
    }

    /// Run a tool on its own task so a panicking tool surfaces as an error.
    async fn run_tool(&self, tool_name: &str, args: ToolArgs) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(tool_name)
            .cloned()
            .ok_or_else(|| self.tools.not_found(tool_name))?;

        match tokio::spawn(async move { tool.execute(args).await }).await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                Err(anyhow::anyhow!("Tool '{}' panicked", tool_name))
            }
            Err(_) => Err(anyhow::anyhow!("Tool '{}' was cancelled", tool_name)),
        }
    }

    /// Answer the pending calls without running them and close the turn.
    fn stop_at_round_limit(&mut self, tool_calls: &[ToolCall]) -> String {
        let limit = self.max_tool_rounds;
        self.observer.on_depth_limit(&self.name, limit);

        for tool_call in tool_calls {
            self.transcript.push(ChatMessage::tool_result(
                tool_call,
                format!("Error: tool call limit of {} rounds reached", limit),
            ));
        }

        let notice = format!(
            "Stopped after {} tool call rounds without a final answer.",
            limit
        );
        self.transcript.push(ChatMessage::assistant(notice.clone()));
        notice
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tools)
            .field("messages", &self.transcript.len())
            .finish()
    }
}
