use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use daybook_common::Config;
use daybook_newsroom::adapters::adapter_suite;
use daybook_newsroom::agents::Generators;
use daybook_newsroom::pipeline::{write_state_snapshot, Newsroom};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Agentic newsroom: plan, retrieve, draft, and publish a daily entry")]
#[command(version)]
struct Cli {
    /// Planner directive. Falls back to DAYBOOK_DEFAULT_PLAN when omitted.
    #[arg(short, long)]
    plan: Option<String>,

    /// File path for a JSON dump of the final run state
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a notice to stdout as each stage completes
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("daybook=info".parse()?))
        .init();

    let cli = Cli::parse();

    info!("Daybook newsroom starting...");

    let config = Config::from_env();
    config.log_redacted();

    let http = reqwest::Client::new();
    let adapters = adapter_suite(&config, http);
    let generators = Generators::from_config(&config)?;

    let directive = cli
        .plan
        .unwrap_or_else(|| config.default_plan.clone());

    let newsroom = Newsroom::new(&config, adapters, generators);
    let state = if cli.stream {
        newsroom
            .run_with_progress(&directive, |stage| println!("[stage:{stage}]"))
            .await?
    } else {
        newsroom.run(&directive).await?
    };

    if let Some(publication) = &state.publication {
        info!(path = publication.publish_path.as_str(), "Entry published");
    }

    if let Some(output) = &cli.output {
        write_state_snapshot(output, &state).await?;
        info!(path = %output.display(), "Final state snapshot written");
    }

    Ok(())
}
