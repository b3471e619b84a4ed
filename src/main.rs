use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use newsboy::api::{self, AppState};
use newsboy::cli::chat::{run_chat, ChatBot};
use newsboy::cli::shell::run_shell;
use newsboy::cli::tail::run_tail;
use newsboy::cli::{Cli, Commands};
use newsboy::config::Config;
use newsboy::errors::NewsboyResult;
use newsboy::logging::configure_logging;
use newsboy::services::{Collector, Console, ItemStyle, Poller};
use newsboy::sources::{HtmlFetcher, SourceRegistry};
use newsboy::storage::{snapshot, ItemCache};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> NewsboyResult<()> {
    let cli = Cli::parse();
    configure_logging();

    // Load configuration, command line flags win over the environment
    let mut config = Config::from_env()?;
    if let Some(path) = cli.sources_file {
        config.sources_path = Some(path);
    }
    if let Some(secs) = cli.interval {
        config.poll_interval = Duration::from_secs(secs);
    }

    let registry = SourceRegistry::load(config.sources_path.as_deref())?;

    match cli.command {
        Commands::Sources => cmd_sources(&registry),
        Commands::Shell => cmd_shell(registry, &config).await,
        Commands::Serve { bind } => cmd_serve(registry, &config, bind).await,
        Commands::Tail => cmd_tail(registry, &config).await,
        Commands::Chat { bot_id } => cmd_chat(registry, &config, &bot_id).await,
    }
}

fn build_poller(registry: SourceRegistry, config: &Config) -> NewsboyResult<Arc<Poller>> {
    let fetcher = Arc::new(HtmlFetcher::new(&config.user_agent)?);
    let collector = Collector::new(registry.into_shared(), fetcher);
    Ok(Arc::new(Poller::new(
        Arc::new(ItemCache::new()),
        collector,
        config.poll_interval,
    )))
}

/// Restore read items from the snapshot file, if there is one
fn restore_snapshot(cache: &ItemCache, path: &str) {
    if !Path::new(path).exists() {
        return;
    }
    match snapshot::restore(cache, path) {
        Ok(count) => info!("Restored {} read items from {}", count, path),
        Err(e) => warn!("Could not restore {}: {}", path, e),
    }
}

fn cmd_sources(registry: &SourceRegistry) -> NewsboyResult<()> {
    println!("Configured sources:\n");
    for source in registry.sources() {
        println!("  {} [{}]", source.name, source.rule);
        println!("    URL: {}", source.url);
        println!("    Selector: {}", source.selector);
        println!();
    }
    Ok(())
}

async fn cmd_shell(registry: SourceRegistry, config: &Config) -> NewsboyResult<()> {
    let poller = build_poller(registry, config)?;
    let console = Console::new(poller, &config.cache_path, ItemStyle::Colored);
    run_shell(console, config.tail_interval).await
}

async fn cmd_serve(
    registry: SourceRegistry,
    config: &Config,
    bind: Option<String>,
) -> NewsboyResult<()> {
    let poller = build_poller(registry, config)?;
    restore_snapshot(poller.cache(), &config.cache_path);

    let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let state = AppState {
        poller: Arc::clone(&poller),
    };

    api::serve(state, &bind_addr, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    poller.stop();
    let count = snapshot::save(poller.cache(), &config.cache_path)?;
    info!("Saved {} read items to {}", count, config.cache_path);
    Ok(())
}

async fn cmd_tail(registry: SourceRegistry, config: &Config) -> NewsboyResult<()> {
    let poller = build_poller(registry, config)?;
    run_tail(poller, config.tail_interval).await
}

async fn cmd_chat(registry: SourceRegistry, config: &Config, bot_id: &str) -> NewsboyResult<()> {
    let poller = build_poller(registry, config)?;
    let console = Console::new(poller, &config.cache_path, ItemStyle::Plain);
    let bot = ChatBot::new(bot_id, console)?;
    run_chat(bot).await
}
