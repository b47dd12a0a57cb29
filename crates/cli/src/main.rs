use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_agents::{SparkieAgent, SuggestionCarousel};
use folio_core::{
    detect_links, render::TYPEWRITER_TICK, resolve_profile, typewriter_frames, ConversationMessage,
    RenderHint, Responder,
};
use folio_observability::{init_tracing, AssistantMetrics};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "sparkie")]
#[command(about = "Sparkie portfolio assistant CLI")]
struct Cli {
    /// Alternate profile JSON; the built-in profile is used when absent.
    #[arg(long, env = "FOLIO_PROFILE")]
    profile: Option<PathBuf>,

    #[arg(long, env = "FOLIO_THINKING_DELAY_MS", default_value_t = 700)]
    delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat {
        /// Print replies at once instead of typing them out.
        #[arg(long)]
        no_typewriter: bool,
    },
    Ask {
        query: String,
        #[arg(long)]
        json: bool,
    },
    Profile,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("folio_cli");
    let cli = Cli::parse();

    let profile = resolve_profile(cli.profile.as_deref()).with_context(|| match &cli.profile {
        Some(path) => format!("failed loading profile from {}", path.display()),
        None => "failed loading built-in profile".to_string(),
    })?;
    let agent = SparkieAgent::new(
        Arc::new(Responder::new(Arc::new(profile))),
        AssistantMetrics::shared(),
    )
    .with_thinking_delay(Duration::from_millis(cli.delay_ms));

    match cli.command {
        Command::Chat { no_typewriter } => run_chat(agent, !no_typewriter).await?,
        Command::Ask { query, json } => {
            let Some(query) = SparkieAgent::prepare_query(&query) else {
                anyhow::bail!("query must not be empty");
            };
            let resolution = agent.answer(&query);
            if json {
                let payload = json!({
                    "reply": resolution.text,
                    "intent": resolution.intent,
                    "score": resolution.score,
                    "links": detect_links(&resolution.text),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", resolution.text);
            }
        }
        Command::Profile => {
            println!("{}", serde_json::to_string_pretty(agent.profile())?);
        }
    }

    Ok(())
}

async fn run_chat(agent: SparkieAgent, typewriter: bool) -> Result<()> {
    let mut session = agent.start_session();
    let mut suggestions = SuggestionCarousel::default();

    for message in session.transcript() {
        print_message(message, typewriter).await?;
    }
    println!("type 'exit' to quit.\n");

    let stdin = io::stdin();
    loop {
        if let Some(hint) = suggestions.current() {
            println!("(try: {hint})");
        }
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if session.submit(message).is_none() {
            continue;
        }

        println!("thinking…");
        if let Some(reply) = session.next_reply().await {
            print_message(&reply, typewriter).await?;
        }
        suggestions.advance();
    }

    Ok(())
}

async fn print_message(message: &ConversationMessage, typewriter: bool) -> Result<()> {
    if !typewriter || message.render == RenderHint::Instant {
        println!("\n{}\n", message.text);
        return Ok(());
    }

    let mut stdout = io::stdout();
    let mut printed = 0;
    writeln!(stdout)?;
    for frame in typewriter_frames(&message.text) {
        write!(stdout, "{}", &frame[printed..])?;
        stdout.flush()?;
        printed = frame.len();
        tokio::time::sleep(TYPEWRITER_TICK).await;
    }
    writeln!(stdout, "\n")?;
    Ok(())
}
