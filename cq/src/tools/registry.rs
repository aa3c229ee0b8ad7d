//! ToolRegistry - name-keyed tool lookup and advertisement

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::goal::GoalTool;
use super::remote::RemoteTool;
use super::{Tool, ToolError};
use crate::model::ToolDefinition;

/// Maps tool names to implementations
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Create a registry with the reserved goal-report tool registered
    ///
    /// Registering it makes the tool visible in `definitions()`, so model
    /// sources advertise it.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(GoalTool);
        registry
    }

    /// Add a tool, replacing any existing tool of the same name
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        debug!(%name, "ToolRegistry::register: called");
        self.tools.insert(name, Arc::new(tool));
    }

    /// Import every tool a connected MCP server reports
    ///
    /// Returns how many tools were registered.
    pub async fn register_remote(&mut self, client: Arc<mcplink::Client>) -> Result<usize, ToolError> {
        debug!("ToolRegistry::register_remote: called");
        let listed = client.list_tools().await?;
        let count = listed.len();
        for info in listed {
            self.register(RemoteTool::new(client.clone(), info));
        }
        info!(count, "imported remote tools");
        Ok(count)
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Definitions of every registered tool, for model advertisement
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect()
    }

    /// Definitions for a subset of tools by name
    pub fn definitions_for(&self, tool_names: &[String]) -> Vec<ToolDefinition> {
        tool_names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
