pub mod agents;
pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod progress;

use quorum_config::AppConfig;
use quorum_core::agent::{Agent, AgentRegistry};
use quorum_core::event::EventBus;
use std::path::Path;
use std::sync::Arc;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the agent registry, failing early when no API key is set.
pub fn build_registry(
    config: &AppConfig,
) -> Result<(AgentRegistry, Arc<EventBus>), Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    AZURE_OPENAI_API_KEY   (Azure OpenAI, default provider)");
        eprintln!("    OPENAI_API_KEY         (OpenAI direct)");
        eprintln!("    QUORUM_API_KEY         (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let event_bus = Arc::new(EventBus::default());
    let registry = quorum_agent::build_from_config(config, event_bus.clone())?;
    Ok((registry, event_bus))
}

/// Resolve the requested agent, or the configured default.
pub fn select_agent(
    registry: &AgentRegistry,
    requested: Option<&str>,
    config: &AppConfig,
) -> Result<Arc<dyn Agent>, Box<dyn std::error::Error>> {
    let key = requested.unwrap_or(&config.agent.default_agent);
    registry.lookup(key).ok_or_else(|| {
        format!(
            "Unknown agent '{key}'. Available: {}",
            registry.keys().join(", ")
        )
        .into()
    })
}
