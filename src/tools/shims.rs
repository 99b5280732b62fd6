//! Argument parsing and per-tool argument remapping.
//!
//! Models do not always use the parameter names a tool declares. A shim maps
//! the names a model tends to send onto the names the tool expects and fills
//! in defaults for missing keys. Shims are looked up by tool name; tools
//! without one get the parsed arguments unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::ToolArgs;

/// Parse a raw argument payload into a key/value map.
///
/// Empty input, malformed JSON and non-object JSON all yield an empty map.
pub fn parse_arguments(raw: &str) -> ToolArgs {
    if raw.trim().is_empty() {
        return ToolArgs::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "Tool arguments are not an object");
            ToolArgs::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse tool arguments");
            ToolArgs::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Remapping function registered for a tool.
pub type RemapFn = dyn Fn(ToolArgs) -> ToolArgs + Send + Sync;

/// One output key: where to read it from and what to use when it is absent.
#[derive(Debug, Clone)]
struct KeyRule {
    target: String,
    aliases: Vec<String>,
    default: Value,
}

/// Declarative shim: a list of output keys built from aliases and defaults.
///
/// The output contains only the declared target keys. For each key the first
/// alias present wins, then the target key itself, then the default.
#[derive(Debug, Clone, Default)]
pub struct ArgumentShim {
    rules: Vec<KeyRule>,
}

impl ArgumentShim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, target: &str, aliases: &[&str], default: impl Into<Value>) -> Self {
        self.rules.push(KeyRule {
            target: target.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            default: default.into(),
        });
        self
    }

    pub fn apply(&self, mut args: ToolArgs) -> ToolArgs {
        let mut out = ToolArgs::new();
        for rule in &self.rules {
            let value = rule
                .aliases
                .iter()
                .find_map(|alias| args.remove(alias))
                .or_else(|| args.remove(&rule.target))
                .unwrap_or_else(|| rule.default.clone());
            out.insert(rule.target.clone(), value);
        }
        out
    }
}

/// Lookup table from tool name to its argument remapping.
#[derive(Clone, Default)]
pub struct ArgumentShims {
    table: HashMap<String, Arc<RemapFn>>,
}

impl ArgumentShims {
    /// An empty table: every tool receives its parsed arguments unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shims for the storefront assistant tools.
    pub fn storefront() -> Self {
        let mut shims = Self::new();
        shims.register_shim(
            "GetProductRecommendation",
            ArgumentShim::new()
                .key("product_category", &["category"], "Laptops")
                .key("user_query", &["description"], "Show me all gaming laptops"),
        );
        shims.register_shim(
            "GetStoreInfo",
            ArgumentShim::new().key("search_query", &["query"], "Show me available products"),
        );
        shims.register_shim(
            "GenerateCalendlyInvitationLink",
            ArgumentShim::new().key("query", &["description"], "Consultation"),
        );
        shims
    }

    /// Register an arbitrary remapping function for a tool.
    pub fn register<F>(&mut self, tool_name: &str, remap: F)
    where
        F: Fn(ToolArgs) -> ToolArgs + Send + Sync + 'static,
    {
        self.table.insert(tool_name.to_string(), Arc::new(remap));
    }

    pub fn register_shim(&mut self, tool_name: &str, shim: ArgumentShim) {
        self.register(tool_name, move |args| shim.apply(args));
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.table.contains_key(tool_name)
    }

    /// Final arguments for a call to `tool_name`.
    pub fn resolve(&self, tool_name: &str, args: ToolArgs) -> ToolArgs {
        match self.table.get(tool_name) {
            Some(remap) => remap(args),
            None => args,
        }
    }
}

impl std::fmt::Debug for ArgumentShims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ArgumentShims").field("tools", &names).finish()
    }
}
