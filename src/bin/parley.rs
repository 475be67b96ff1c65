//! Parley CLI - Command-line interface for dialogue scripts
//!
//! Provides subcommands for checking, inspecting, and running scripts
//! against the built-in demo back end.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use parley::interpreter::InputSource;
use parley::support::{KeywordResolver, ScriptedInput, StdinInput, demo_store, standard_actions};
use parley::{Script, parse_script};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Line-oriented dialogue-flow DSL and interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and report whether it is runnable
    Check {
        /// Path to the script file
        script: PathBuf,
    },

    /// Print the parsed structure of a script
    Inspect {
        /// Path to the script file
        script: PathBuf,

        /// Emit JSON instead of the plain outline
        #[arg(long)]
        json: bool,
    },

    /// Run a script against the demo order-service back end
    Run {
        /// Path to the script file
        script: PathBuf,

        /// Scripted user turn; repeat for a whole conversation.
        /// Without any, turns are read from stdin.
        #[arg(long = "turn")]
        turns: Vec<String>,
    },
}

fn load(path: &Path) -> anyhow::Result<Script> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_script(&source).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { script } => {
            let script = load(&script)?;
            println!(
                "ok: {} steps, {} vars, entry {}",
                script.len(),
                script.vars.len(),
                script.entry.as_deref().unwrap_or("(none)")
            );
        }

        Commands::Inspect { script, json } => {
            let script = load(&script)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&script)?);
            } else {
                println!("{script}");
            }
        }

        Commands::Run { script, turns } => {
            let script = load(&script)?;
            let mut actions = standard_actions(demo_store());
            let intents = KeywordResolver::new();
            let mut input: Box<dyn InputSource> = if turns.is_empty() {
                Box::new(StdinInput::new())
            } else {
                Box::new(ScriptedInput::new(turns))
            };
            let mut stdout = std::io::stdout();

            let report = parley::Session::new(&script, &mut actions, &intents, input.as_mut())
                .with_echo(&mut stdout)
                .run();
            stdout.flush()?;

            println!("-- outcome: {}", report.outcome);
            if report.outcome.is_fatal() {
                bail!("run aborted: {}", report.outcome);
            }
        }
    }

    Ok(())
}
