//! Adjutant — local agentic assistant
//!
//! All model inference happens against a local Ollama-compatible server;
//! nothing leaves the machine unless a web tool is explicitly invoked.

use adjutant::app::AppContext;
use adjutant::cli::{Cli, Command, ConfigAction};
use adjutant::config::Config;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Chat(args)) => adjutant::cli::chat::execute(args).await,
        Some(Command::Run(args)) => adjutant::cli::run::execute(args).await,
        Some(Command::Serve(args)) => {
            let mut config = Config::load().await?;
            if let Some(bind) = args.bind {
                config.server.bind = bind;
            }
            let ctx = AppContext::build(config).await?;
            adjutant::server::serve(ctx).await
        }
        Some(Command::Index(args)) => adjutant::cli::index::execute(args).await,
        Some(Command::Config(args)) => match args.action {
            ConfigAction::Init => Config::init_default().await,
            ConfigAction::Show => {
                let config = Config::load().await?;
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        },
        None => adjutant::cli::chat::execute(adjutant::cli::ChatArgs { model: None }).await,
    }
}
