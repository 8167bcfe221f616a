//! `digibuddy knowledge`: List the curated answers.

use digibuddy_config::AppConfig;
use digibuddy_resolver::load_knowledge;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let knowledge = load_knowledge(&config.resolver)?;

    let source = match &config.resolver.knowledge_file {
        Some(path) => path.display().to_string(),
        None => "built-in".into(),
    };
    println!("Knowledge base ({source}, {} entries)", knowledge.len());
    println!();

    for (i, entry) in knowledge.entries().iter().enumerate() {
        println!("{:>3}. {}", i + 1, entry.question);
        if let Some(topic) = &entry.topic {
            println!("     topic: {topic}");
        }
    }

    Ok(())
}
