//! Warbot CLI binary entry point.

use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use warbot::agent::{Conversation, ConversationOptions, DEFAULT_SYSTEM_PROMPT};
use warbot::cli::{next_input, Cli, ConsoleSink};
use warbot::config::WarbotConfig;
use warbot::error::WarbotError;
use warbot::tools::{builtin, ToolRegistry};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("warbot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warbot=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), WarbotError> {
    let config = cli.apply(WarbotConfig::load()?);
    tracing::debug!(?config, "configuration loaded");

    let provider = warbot::provider::create_provider(&config)?;

    let mut registry = ToolRegistry::new();
    for tool in builtin::all_tools() {
        registry.register(tool)?;
    }

    let options = ConversationOptions::builder()
        .system_prompt(DEFAULT_SYSTEM_PROMPT)
        .maybe_max_rounds(config.max_rounds)
        .build();
    let mut conversation = Conversation::new(Arc::new(provider), registry, options);
    let mut sink = ConsoleSink::new();

    if let Some(question) = cli.question {
        let result = conversation.send_message(&question, &mut sink).await;
        sink.finish();
        return result.map(|_| ());
    }

    println!("Warbot ready. Type 'exit' or 'quit' to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(input) = next_input(&mut lines).await? else {
            break;
        };

        let result = conversation.send_message(&input, &mut sink).await;
        sink.finish();
        if let Err(e) = result {
            eprintln!("Error: {e}");
        }
    }
    Ok(())
}
