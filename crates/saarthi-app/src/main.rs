//! Saarthi application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the turn pipeline on the offline rule backend
//! 4. Run one message (`--once`) or an interactive loop on stdin

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use saarthi_chat::{ChatError, Orchestrator, TurnOutcome};
use saarthi_core::config::SaarthiConfig;
use saarthi_core::types::TurnContext;
use saarthi_rules::{CopingLibrary, RuleBasedCompletion};

use cli::CliArgs;

/// Build the pipeline from config.
fn build_pipeline(config: &SaarthiConfig) -> Orchestrator {
    let pipeline = Orchestrator::new(Arc::new(RuleBasedCompletion::new()), config);
    if config.synthesis.grounding_enabled {
        pipeline.with_grounding(Arc::new(CopingLibrary::new()))
    } else {
        pipeline
    }
}

/// Print one outcome for the user.
fn render(outcome: &TurnOutcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::error!(error = %e, "Failed to serialize outcome"),
        }
        return;
    }

    let stamp = chrono::Local::now().format("%H:%M:%S");
    println!("[{}] saarthi> {}", stamp, outcome.reply);
    if outcome.safety_flag {
        print_crisis_notice();
    }
}

fn print_crisis_notice() {
    let lines = [
        "You matter. If you are in danger, call your local emergency number.",
        "US: call or text 988 (Suicide & Crisis Lifeline).",
        "Elsewhere: https://findahelpline.com",
    ];
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    println!("+{}+", "-".repeat(width + 2));
    for line in lines {
        println!("| {:<width$} |", line, width = width);
    }
    println!("+{}+", "-".repeat(width + 2));
}

/// Run one turn, cancelling it if Ctrl-C arrives first.
async fn run_turn(
    pipeline: &Orchestrator,
    text: &str,
    prior: Option<&TurnContext>,
) -> Option<Result<TurnOutcome, ChatError>> {
    tokio::select! {
        result = pipeline.process_turn(text, prior) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Turn cancelled by user");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = SaarthiConfig::load_or_default(&config_file);

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Saarthi v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let pipeline = build_pipeline(&config);

    if let Some(text) = args.once.as_deref() {
        return match run_turn(&pipeline, text, None).await {
            Some(Ok(outcome)) => {
                render(&outcome, args.json);
                Ok(())
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(()),
        };
    }

    println!("Saarthi is listening. Type a message, or /quit to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut prior: Option<TurnContext> = None;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let text = line.trim();
        if text == "/quit" || text == "/exit" {
            break;
        }

        match run_turn(&pipeline, text, prior.as_ref()).await {
            Some(Ok(outcome)) => {
                render(&outcome, args.json);
                if !args.no_carry {
                    prior = outcome.context;
                }
            }
            Some(Err(ChatError::InvalidInput(e))) => {
                println!("(nothing sent: {})", e);
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Turn failed");
                println!("{}", config.safety.fallback_reply);
            }
            None => println!("(cancelled)"),
        }
    }

    tracing::info!("Saarthi stopped");
    Ok(())
}
