//! `quorum config`: Configuration management commands.

use quorum_config::AppConfig;
use std::path::Path;

fn config_file(config_path: Option<&Path>) -> std::path::PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Copy of `config` with every secret blanked.
pub fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("[REDACTED]".into());
        }
    };
    mask(&mut config.api_key);
    mask(&mut config.retrieval.search_api_key);
    for provider in config.providers.values_mut() {
        mask(&mut provider.api_key);
    }
    config
}

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e);
        }
    };
    println!("   Config parsed successfully");

    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push(
            "No API key set (set AZURE_OPENAI_API_KEY, OPENAI_API_KEY or QUORUM_API_KEY)".to_string(),
        );
    }
    if config.default_provider == "azure"
        && config
            .providers
            .get("azure")
            .and_then(|p| p.api_url.as_ref())
            .is_none()
        && std::env::var("AZURE_OPENAI_ENDPOINT").is_err()
    {
        warnings.push(
            "Azure endpoint not set ([providers.azure] api_url or AZURE_OPENAI_ENDPOINT)".to_string(),
        );
    }
    let retrieval = &config.retrieval;
    if retrieval.search_endpoint.is_some() && !retrieval.has_search_service() {
        warnings.push("Search endpoint set without search_index and search_api_key".to_string());
    }
    if let Some(seed) = &retrieval.seed_file {
        if !Path::new(seed).exists() {
            warnings.push(format!("Seed file not found: {seed}"));
        }
    }

    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Provider:   {}", config.default_provider);
    println!("   Model:      {}", config.default_model);
    println!("   Agent:      {}", config.agent.default_agent);
    println!("   Steps:      {} (retries {})", config.agent.max_steps, config.agent.max_retries);
    println!(
        "   Sandbox:    {}",
        if config.sandbox.enabled { config.sandbox.interpreter.as_str() } else { "disabled" }
    );

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&redacted(&config))?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_file(config_path).display());
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let file = dir.join("config.toml");
    if file.exists() {
        println!("Config already exists at {}", file.display());
        return Ok(());
    }
    std::fs::create_dir_all(&dir)?;
    std::fs::write(&file, AppConfig::default_toml())?;
    println!("Wrote default config to {}", file.display());
    Ok(())
}
