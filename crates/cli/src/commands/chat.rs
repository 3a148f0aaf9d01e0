//! `quorum chat`: Interactive session. Earlier turns are passed to the
//! agent as `conversation_history`.

use super::ask::print_response;
use super::progress::{spawn_event_logger, StderrProgress};
use quorum_core::agent::Invocation;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Turns kept in the history handed to the agent.
const HISTORY_TURNS: usize = 10;

/// Rolling transcript of the session, rendered as plain text.
#[derive(Debug, Default)]
pub struct History {
    turns: Vec<(String, String)>,
}

impl History {
    pub fn record(&mut self, user: &str, assistant: &str) {
        self.turns.push((user.to_string(), assistant.to_string()));
        if self.turns.len() > HISTORY_TURNS {
            self.turns.remove(0);
        }
    }

    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|(u, a)| format!("User: {u}\nAssistant: {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn run(
    config_path: Option<&Path>,
    agent: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let (registry, bus) = super::build_registry(&config)?;
    let _logger = spawn_event_logger(&bus);
    let agent = super::select_agent(&registry, agent.as_deref(), &config)?;

    println!();
    println!("  Quorum: Interactive Mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Agent:     {} ({})", agent.name(), agent.key());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let sink = StderrProgress;
    let mut history = History::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }

        let mut context = serde_json::Map::new();
        let rendered = history.render();
        if !rendered.is_empty() {
            context.insert("conversation_history".into(), serde_json::Value::String(rendered));
        }
        let invocation = Invocation::new(&registry).with_context(&context).with_progress(&sink);

        let response = agent.execute(query, invocation).await;
        println!();
        print_response(&response);
        println!();
        history.record(query, &response.content);
    }

    println!("  Goodbye!");
    Ok(())
}
