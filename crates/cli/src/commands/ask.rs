//! `quorum ask`: Send one query to an agent.

use super::progress::{spawn_event_logger, StderrProgress};
use quorum_core::agent::{AgentResponse, Invocation};
use std::path::Path;

/// Caller context passed alongside the query.
#[derive(Debug, Default)]
pub struct ExtraContext {
    pub schema: Option<String>,
    pub data_summary: Option<String>,
}

impl ExtraContext {
    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        if let Some(schema) = self.schema {
            map.insert("schema".into(), serde_json::Value::String(schema));
        }
        if let Some(summary) = self.data_summary {
            map.insert("data_summary".into(), serde_json::Value::String(summary));
        }
        map
    }
}

pub async fn run(
    config_path: Option<&Path>,
    query: &str,
    agent: Option<String>,
    extra: ExtraContext,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let (registry, bus) = super::build_registry(&config)?;
    let _logger = spawn_event_logger(&bus);
    let agent = super::select_agent(&registry, agent.as_deref(), &config)?;

    let context = extra.into_map();
    let sink = StderrProgress;
    let invocation = Invocation::new(&registry).with_context(&context).with_progress(&sink);

    let response = agent.execute(query, invocation).await;
    print_response(&response);

    match response.error {
        Some(error) if !response.success => Err(error.into()),
        _ => Ok(()),
    }
}

pub fn print_response(response: &AgentResponse) {
    println!("{}", response.content);
    if !response.sources.is_empty() {
        eprintln!();
        eprintln!("  Sources: {}", response.sources.join(", "));
    }
    if let Some(attachment) = &response.attachment {
        eprintln!("  Attachment: base64 image ({} bytes)", attachment.len());
    }
    eprintln!("  Answered by: {}", response.agent_name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_context_skips_missing_keys() {
        let map = ExtraContext {
            schema: Some("orders(id, total)".into()),
            data_summary: None,
        }
        .into_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["schema"], "orders(id, total)");
    }
}
