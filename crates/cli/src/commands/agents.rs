//! `quorum agents`: List registered agents.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let (registry, _bus) = super::build_registry(&config)?;

    println!();
    println!("  Agents ({}):", registry.len());
    for agent in registry.agents() {
        let marker = if agent.key() == config.agent.default_agent { "*" } else { " " };
        println!("  {marker} {:<14} {:<18} {}", agent.key(), agent.name(), agent.description());
    }
    println!();
    println!("  * default agent");
    Ok(())
}
