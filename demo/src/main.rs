//! Homework tutor CLI
//!
//! Asks the tutor one question, either against an OpenAI-compatible endpoint
//! or fully offline with scripted answers.
//!
//! Usage:
//!   cargo run -p demo -- ask "Math Tutor: solve 2x + 3 = 7" --offline
//!   cargo run -p demo -- ask "tell me a joke" --bypass
//!   cargo run -p demo -- agents --roster crates/handoff-ref-tutor/roster/tutor.toml

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use handoff_contracts::error::TriageResult;
use handoff_core::{Agent, CompletionService, Runner};
use handoff_openai::{
    client::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS},
    OpenAiCompletion, OpenAiConfig,
};
use handoff_policy::AgentRoster;
use handoff_ref_tutor::{
    agents::TRIAGE_AGENT, load_roster, triage_agent, ScriptedCompletion, TutorReply,
    TutorSession,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Homework tutor with a guardrail.
///
/// A triage agent routes each question to the Math Tutor or the History
/// Tutor, after a homework check has approved it.
#[derive(Parser)]
#[command(
    name = "tutor",
    about = "Homework tutor with a guardrail",
    long_about = "Routes a question to a subject tutor after a homework policy check.\n\
                  Name a tutor in the question (\"Math Tutor: ...\") to be routed to it."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the tutor one question.
    Ask(AskArgs),
    /// List the agents of a roster.
    Agents {
        /// Roster TOML file. Defaults to the bundled tutor roster.
        #[arg(long)]
        roster: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct AskArgs {
    /// The question.
    question: String,

    /// Answer even if the homework check says no.
    #[arg(long)]
    bypass: bool,

    /// Use scripted answers instead of a completion endpoint.
    #[arg(long)]
    offline: bool,

    /// Roster TOML file. Defaults to the built-in tutor agents.
    #[arg(long)]
    roster: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask(args) => ask(args).await,
        Command::Agents { roster } => list_agents(roster),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn ask(args: AskArgs) -> TriageResult<()> {
    let triage = match &args.roster {
        Some(path) => AgentRoster::from_file(path)?.agent(TRIAGE_AGENT)?,
        None => triage_agent(),
    };
    if let Err(e) = triage.validate_delegation() {
        warn!(error = %e, "triage agent failed delegation check");
        return Err(e);
    }

    let service: Arc<dyn CompletionService> = if args.offline {
        info!("using scripted offline answers");
        Arc::new(ScriptedCompletion)
    } else {
        Arc::new(OpenAiCompletion::new(OpenAiConfig {
            base_url: args.base_url,
            model: args.model,
            api_key: args.api_key,
            timeout_secs: args.timeout_secs,
        })?)
    };

    let runner = Runner::new(service);
    let cancel = runner.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut session = TutorSession::new(runner, triage);
    let reply = session.ask(&args.question, args.bypass).await;

    if let TutorReply::Failed { .. } = reply {
        eprintln!("{reply}");
        std::process::exit(1);
    }
    println!("{reply}");
    Ok(())
}

fn list_agents(roster: Option<PathBuf>) -> TriageResult<()> {
    let roster = match roster {
        Some(path) => AgentRoster::from_file(&path)?,
        None => load_roster()?,
    };

    for agent in roster.agents() {
        print_agent(agent);
    }
    Ok(())
}

fn print_agent(agent: &Agent) {
    println!("{agent}");
    if let Some(description) = agent.handoff_description() {
        println!("  handoff:    {description}");
    }
    println!("  output:     {}", agent.output_shape().shape_id());
    if !agent.delegates().is_empty() {
        let names: Vec<&str> = agent.delegates().iter().map(|d| d.name()).collect();
        println!("  delegates:  {}", names.join(", "));
    }
    if !agent.guardrails().is_empty() {
        let names: Vec<&str> = agent.guardrails().iter().map(|g| g.name()).collect();
        println!("  guardrails: {}", names.join(", "));
    }
}
