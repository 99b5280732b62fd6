//! Tool system: the `Tool` trait, the typed `Invocable` contract and the registry.
//!
//! Tools are advertised to the model by name, description and JSON parameter
//! schema. Lookup by name is exact.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::llm::ToolDefinition;

pub mod shims;

pub use shims::{parse_arguments, ArgumentShim, ArgumentShims};

/// Resolved tool arguments.
pub type ToolArgs = Map<String, Value>;

/// A capability the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String>;
}

/// A tool that is constructed from its arguments and then run.
///
/// The implementing type is deserialized from the resolved argument map;
/// a deserialization failure is reported the same way as a failing `run`.
#[async_trait]
pub trait Invocable: DeserializeOwned + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parameters_schema() -> Value;

    async fn run(self) -> anyhow::Result<String>;
}

/// Adapts an [`Invocable`] type to the object-safe [`Tool`] trait.
pub struct InvocableTool<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Invocable> InvocableTool<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Invocable> Default for InvocableTool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Invocable> Tool for InvocableTool<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn parameters_schema(&self) -> Value {
        T::parameters_schema()
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<String> {
        let instance: T = serde_json::from_value(Value::Object(args))
            .map_err(|e| anyhow::anyhow!("Invalid arguments for {}: {}", T::NAME, e))?;
        instance.run().await
    }
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Registry of the tools available to an agent.
///
/// Registration order is kept for schema advertisement.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    /// Register an [`Invocable`] type.
    pub fn with_invocable<T: Invocable>(self) -> Self {
        self.with(InvocableTool::<T>::new())
    }

    /// Add a tool. A tool with the same name replaces the earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&idx) => self.tools[idx] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&idx| &self.tools[idx])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Schemas in the format the chat completions API expects.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters_schema()))
            .collect()
    }

    /// Execute a tool by exact name.
    pub async fn execute(&self, name: &str, args: ToolArgs) -> anyhow::Result<String> {
        match self.get(name) {
            Some(tool) => tool.execute(args).await,
            None => Err(self.not_found(name)),
        }
    }

    /// Error for a name that is not registered, listing what is.
    pub fn not_found(&self, name: &str) -> anyhow::Error {
        anyhow::anyhow!(
            "Tool '{}' not found. Available tools: [{}]",
            name,
            self.names().join(", ")
        )
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
