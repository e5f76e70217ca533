//! `crewloop status`: Show effective configuration.

use crewloop_config::AppConfig;

use super::load_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    println!("🔁 crewloop Status");
    println!("==================");
    println!("  Config dir:      {}", AppConfig::config_dir().display());
    println!("  Model:           {}", config.model);
    println!("  Max tokens:      {}", config.max_tokens);
    println!(
        "  Gateway:         {}",
        if config.has_api_key() { "live (Anthropic)" } else { "mock (no API key)" }
    );
    if let Some(url) = &config.api_url {
        println!("  API URL:         {url}");
    }
    println!("  Max iterations:  {}", config.agent.max_iterations);
    println!("  History window:  {}", config.agent.history_window);
    println!("  Memory:          {}", config.memory.backend);
    println!("  Memory path:     {}", config.memory.path.display());
    println!(
        "  Identity:        {}",
        config
            .identity
            .user_id
            .as_deref()
            .unwrap_or(&format!("(none, falls back to {})", config.identity.fallback_user_id))
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file: run `crewloop onboard` first");
    }

    Ok(())
}
