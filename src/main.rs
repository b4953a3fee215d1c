//! seshat CLI: conversational math assistant.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use seshat::classify::classify;
use seshat::config::BotConfig;
use seshat::normalize::normalize;
use seshat::pipeline::MathPipeline;
use seshat::transport::{Query, Reply, ReplySink, StdoutSink};

#[derive(Parser)]
#[command(name = "seshat", version, about = "Conversational math assistant")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User identifier for history scoping.
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single request and print the reply.
    Solve {
        /// The math request, natural language or canonical form.
        expression: String,
    },

    /// Interactive chat loop on stdin.
    Repl,

    /// Show how a request normalizes and classifies (debug aid).
    Classify {
        /// The request text to inspect.
        text: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };
    let pipeline = MathPipeline::new(config);
    let sink = StdoutSink;

    match cli.command {
        Commands::Solve { expression } => {
            let query = Query::new(&cli.user, "cli", expression);
            sink.composing(&query.chat_id);
            let reply = pipeline.handle(&query);
            sink.send("cli", &reply);
        }

        Commands::Repl => {
            sink.send(
                "repl",
                &Reply::new("seshat repl — send a math request, 'history', or 'quit'"),
            );
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                if stdin.read_line(&mut line).into_diagnostic()? == 0 {
                    break;
                }
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if matches!(input, "quit" | "exit") {
                    break;
                }
                if input.eq_ignore_ascii_case("history") {
                    sink.send("repl", &pipeline.history_reply(&cli.user));
                    continue;
                }
                let query = Query::new(&cli.user, "repl", input);
                sink.composing(&query.chat_id);
                let reply = pipeline.handle(&query);
                sink.send("repl", &reply);
            }
        }

        Commands::Classify { text } => {
            let normalized = normalize(&text);
            println!("task:       {}", classify(&text));
            println!("normalized: {normalized}");
        }
    }

    Ok(())
}
