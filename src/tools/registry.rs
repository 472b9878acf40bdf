//! Name → handler registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::validate_arguments;
use super::weather::WeatherTool;
use crate::{Error, Result};

/// Static metadata advertised to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name the model calls
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for the argument object
    pub parameters: Value,
}

/// Executes a tool with already-validated arguments
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool and return its textual result
    ///
    /// # Errors
    ///
    /// Returns error if the tool cannot produce a result
    async fn call(&self, arguments: &Map<String, Value>) -> Result<String>;
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of callable tools, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with `get_weather`
    #[must_use]
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.insert(WeatherTool::descriptor(), Arc::new(WeatherTool::new()));
        registry
    }

    /// Register a tool under `descriptor.name`
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTool` if the name is already taken
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<()> {
        if self.index.contains_key(&descriptor.name) {
            return Err(Error::DuplicateTool(descriptor.name));
        }
        self.insert(descriptor, handler);
        Ok(())
    }

    /// Caller guarantees the name is not registered yet
    fn insert(&mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) {
        tracing::debug!(tool = %descriptor.name, "tool registered");
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.descriptors.push(descriptor.clone());
        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors for every registered tool, in registration order
    #[must_use]
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` against the tool's schema and invoke it
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` if no tool has this name, `InvalidArguments` if
    /// the arguments violate the schema, or whatever the handler returns
    pub async fn resolve(&self, name: &str, arguments: &Map<String, Value>) -> Result<String> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        validate_arguments(&tool.descriptor.parameters, arguments).map_err(|reason| {
            Error::InvalidArguments {
                tool: name.to_string(),
                reason,
            }
        })?;

        let result = tool.handler.call(arguments).await?;
        tracing::info!(tool = name, result_len = result.len(), "tool executed");
        Ok(result)
    }
}
