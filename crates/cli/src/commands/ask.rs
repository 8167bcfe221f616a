//! `digibuddy ask`: Single-question or interactive chat mode.
//!
//! Interactive mode keeps the session's turns in memory and sends them as
//! history with each question, the same way the web client does.

use digibuddy_config::AppConfig;
use digibuddy_core::message::Turn;
use digibuddy_resolver::{ResolutionResult, ResponseResolver, load_knowledge};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let knowledge = Arc::new(load_knowledge(&config.resolver)?);
    let provider = digibuddy_providers::build_from_config(&config)?;
    let resolver = ResponseResolver::from_config(&config, knowledge, provider);

    if let Some(msg) = message {
        let result = resolver.resolve(&msg, &[]).await;
        print_reply(&result, verbose, "");
        return Ok(());
    }

    println!();
    println!("  DigiBuddy — Interactive Mode");
    println!();
    println!("  Model:     {} via {}", config.model, resolver.provider_name());
    println!("  Answers:   {} curated topics", resolver.knowledge().len());
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut history: Vec<Turn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        if question.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }

        let result = resolver.resolve(question, &history).await;
        println!();
        print_reply(&result, verbose, "  DigiBuddy > ");
        println!();

        history.push(Turn::new("user", question));
        history.push(Turn::new("bot", result.text));

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn print_reply(result: &ResolutionResult, verbose: bool, prefix: &str) {
    for line in result.text.lines() {
        println!("{prefix}{line}");
    }
    if verbose {
        eprintln!("  [source: {:?}, degraded: {}]", result.source, result.degraded);
        if let Some(error) = &result.error {
            eprintln!("  [provider error: {error}]");
        }
    }
}
