use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use gitlab_digest::config::{Cli, Config, OpenAiSettings};
use gitlab_digest::pipeline;
use gitlab_digest::utils::llm::OpenAiClient;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up environment
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: could not set up logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

/// The whole error chain on one line, outermost context first.
fn failure_message(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_models {
        return list_models().await;
    }

    let config = Config::from_env(cli).context("Error resolving configuration")?;

    let summary = pipeline::digest(&config)
        .await
        .context("Error building activity digest")?;

    println!("{}", pipeline::render(&config.user, &summary));
    Ok(())
}

async fn list_models() -> Result<()> {
    let settings = OpenAiSettings::from_env().context("Error resolving configuration")?;
    let client = OpenAiClient::new(&settings);

    info!("Listing models available at {}", settings.base_url);
    let models = client
        .list_models()
        .await
        .context("Error listing OpenAI models")?;

    for id in models {
        println!("{}", id);
    }

    Ok(())
}
