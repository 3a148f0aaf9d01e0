//! What distinguishes one agent from another: prompt, tool catalog, local
//! handlers and tool-forcing policy. The execution loop is shared.

use quorum_core::agent::Invocation;
use quorum_core::provider::{ToolChoice, ToolDefinition};
use quorum_core::tool::ToolRegistry;

/// Per-query refinement of a role's declared tool choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolForcing {
    /// Answer in prose; tools are withheld
    ForceOff,
    /// A tool call is required
    ForceOn,
    /// Use the role's declared choice
    ModelDecides,
}

/// Classifies a raw query into a forcing decision.
pub type IntentClassifier = fn(&str) -> ToolForcing;

/// The default classifier: never overrides the declared choice.
pub fn model_decides(_query: &str) -> ToolForcing {
    ToolForcing::ModelDecides
}

pub struct RoleSpec {
    /// Registry key, e.g. "python"
    pub key: String,
    /// Display name, e.g. "Python Agent"
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    /// Tool definitions offered to the model
    pub catalog: Vec<ToolDefinition>,
    /// Handlers for catalog entries that run in-process
    pub local_tools: ToolRegistry,
    pub declared_choice: ToolChoice,
    pub classifier: IntentClassifier,
    /// Caller context key appended to the system prompt, with its heading
    pub prompt_context: Option<(&'static str, &'static str)>,
    /// Caller context key appended to the user query, with its heading
    pub query_context: Option<(&'static str, &'static str)>,
}

impl RoleSpec {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            system_prompt: String::new(),
            catalog: Vec::new(),
            local_tools: ToolRegistry::new(),
            declared_choice: ToolChoice::Auto,
            classifier: model_decides,
            prompt_context: None,
            query_context: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<ToolDefinition>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Attach local handlers and add their definitions to the catalog.
    pub fn with_local_tools(mut self, tools: ToolRegistry) -> Self {
        for def in tools.definitions() {
            if !self.catalog.iter().any(|d| d.name == def.name) {
                self.catalog.push(def);
            }
        }
        self.local_tools = tools;
        self
    }

    pub fn with_choice(mut self, choice: ToolChoice) -> Self {
        self.declared_choice = choice;
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_prompt_context(mut self, key: &'static str, heading: &'static str) -> Self {
        self.prompt_context = Some((key, heading));
        self
    }

    pub fn with_query_context(mut self, key: &'static str, heading: &'static str) -> Self {
        self.query_context = Some((key, heading));
        self
    }

    /// Catalog and tool choice for the next planning turn.
    ///
    /// Once any tool has run, tools are withheld for the rest of the
    /// invocation. An empty catalog always plans with `none`.
    pub fn turn_policy(
        &self,
        query: &str,
        tool_executed: bool,
    ) -> (Vec<ToolDefinition>, ToolChoice) {
        if tool_executed || self.catalog.is_empty() {
            return (Vec::new(), ToolChoice::None);
        }
        match (self.classifier)(query) {
            ToolForcing::ForceOff => (Vec::new(), ToolChoice::None),
            ToolForcing::ForceOn => (self.catalog.clone(), ToolChoice::Required),
            ToolForcing::ModelDecides => (self.catalog.clone(), self.declared_choice),
        }
    }

    /// Role prompt plus the role's caller-context section, if present.
    pub fn prompt_with_context(&self, invocation: &Invocation<'_>) -> String {
        let mut prompt = self.system_prompt.clone();
        if let Some((key, heading)) = self.prompt_context {
            if let Some(value) = invocation.context_str(key) {
                prompt.push_str(&format!("\n\n{heading}:\n{value}"));
            }
        }
        prompt
    }

    /// The user query plus the role's caller-context section, if present.
    pub fn query_with_context(&self, query: &str, invocation: &Invocation<'_>) -> String {
        match self.query_context {
            Some((key, heading)) => match invocation.context_str(key) {
                Some(value) => format!("{query}\n\n{heading}:\n{value}"),
                None => query.to_string(),
            },
            None => query.to_string(),
        }
    }
}
