//! streamrun binary entry point.

use clap::Parser;
use streamrun::cli::{Cli, Commands};
use streamrun::config::StreamrunConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let default_filter = if std::env::var_os("STREAMRUN_DEBUG").is_some() {
        "streamrun=debug,tower_http=debug"
    } else {
        "streamrun=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StreamrunConfig::load()?;
    match cli.command {
        Commands::Chat(args) => {
            let config = match args.model {
                Some(model) => config.with_model(model),
                None => config,
            };
            streamrun::cli::run_chat(&config).await?;
        }
        Commands::Serve(args) => streamrun::server::serve(&args.apply(config)).await?,
    }
    Ok(())
}
