//! Assembles the built-in roles into an [`AgentRegistry`].

use crate::dispatcher::Dispatcher;
use crate::loop_runner::RoleAgent;
use crate::role::RoleSpec;
use crate::roles::{self, SPECIALIST_KEYS};
use quorum_config::{AgentSettings, AppConfig};
use quorum_core::agent::AgentRegistry;
use quorum_core::error::RetrievalError;
use quorum_core::event::EventBus;
use quorum_core::provider::Provider;
use quorum_core::sandbox::CodeExecutor;
use quorum_retrieval::ContextRetriever;
use quorum_tools::ProcessSandbox;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Shared collaborators of every role agent.
#[derive(Clone)]
pub struct AgentDeps {
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub retriever: Arc<ContextRetriever>,
    pub sandbox: Option<Arc<dyn CodeExecutor>>,
    pub event_bus: Arc<EventBus>,
}

impl AgentDeps {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        retriever: Arc<ContextRetriever>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            retriever,
            sandbox: None,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn CodeExecutor>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Provider '{0}' is not configured")]
    ProviderMissing(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Wrap a role in the shared loop.
pub fn role_agent(
    role: RoleSpec,
    deps: &AgentDeps,
    dispatcher: Arc<Dispatcher>,
    settings: &AgentSettings,
) -> RoleAgent {
    let mut agent = RoleAgent::new(
        role,
        deps.provider.clone(),
        deps.model.clone(),
        deps.retriever.clone(),
        dispatcher,
        deps.event_bus.clone(),
    )
    .with_temperature(deps.temperature)
    .with_max_steps(settings.max_steps)
    .with_max_retries(settings.max_retries);
    if let Some(max) = deps.max_tokens {
        agent = agent.with_max_tokens(max);
    }
    agent
}

/// Register the orchestrator and the three specialists.
pub fn build_registry(deps: &AgentDeps, settings: &AgentSettings) -> AgentRegistry {
    let mut dispatcher = Dispatcher::new(deps.event_bus.clone());
    if let Some(sandbox) = &deps.sandbox {
        dispatcher = dispatcher.with_sandbox(sandbox.clone());
    }
    let dispatcher = Arc::new(dispatcher);

    let roles = [
        roles::orchestrator::role(&SPECIALIST_KEYS),
        roles::sql::role(),
        roles::python::role(),
        roles::researcher::role(deps.retriever.clone()),
    ];

    let mut registry = AgentRegistry::new();
    for role in roles {
        registry.register(Arc::new(role_agent(role, deps, dispatcher.clone(), settings)));
    }
    info!(agents = registry.len(), model = %deps.model, "Agent registry built");
    registry
}

/// Build providers, retrieval and sandbox from configuration, then the
/// registry.
pub fn build_from_config(
    config: &AppConfig,
    event_bus: Arc<EventBus>,
) -> Result<AgentRegistry, BuildError> {
    let router = quorum_providers::build_from_config(config);
    let provider = router
        .default()
        .ok_or_else(|| BuildError::ProviderMissing(config.default_provider.clone()))?;
    let retriever = Arc::new(quorum_retrieval::build_from_config(&config.retrieval)?);

    let mut deps = AgentDeps::new(provider, config.default_model.clone(), retriever)
        .with_event_bus(event_bus);
    deps.temperature = config.default_temperature;
    deps.max_tokens = Some(config.default_max_tokens);
    if config.sandbox.enabled {
        deps = deps.with_sandbox(Arc::new(ProcessSandbox::from_config(&config.sandbox)));
    }

    Ok(build_registry(&deps, &config.agent))
}
