//! `digibuddy config`: Configuration management commands.

use digibuddy_config::AppConfig;
use digibuddy_resolver::load_knowledge;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   Config parsed successfully");

    let knowledge = match load_knowledge(&config.resolver) {
        Ok(knowledge) => knowledge,
        Err(e) => {
            println!("   Knowledge base error: {e}");
            return Err(e.into());
        }
    };
    println!("   Knowledge base loaded ({} entries)", knowledge.len());

    if let Err(e) = digibuddy_providers::build_from_config(&config) {
        println!("   Provider error: {e}");
        return Err(e.into());
    }

    let mut warnings = Vec::new();

    if !config.has_api_key() && config.provider != "ollama" {
        warnings.push("No API key set (set OPENAI_API_KEY or DIGIBUDDY_API_KEY); every delegated question will get the fallback reply");
    }

    if config.resolver.history_limit.is_none() {
        warnings.push("resolver.history_limit is unset; all client-supplied history is forwarded to the model");
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
    println!("   Provider:  {}", config.provider);
    println!("   Model:     {}", config.model);
    println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.to_toml()?);
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
