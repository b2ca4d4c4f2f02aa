mod cli;
mod commands;
mod config;
mod seed;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use services::{AppServices, AuthContext, Clock, ErrorKind, NewsService, ServiceError};
use storage::repository::Storage;

use crate::cli::{Cli, Command};
use crate::commands::Ctx;
use crate::config::{AppConfig, prepare_sqlite_file};

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_cli(&cli)?;

    // Open + migrate SQLite at startup so services only see repositories.
    prepare_sqlite_file(&config.db_url)?;
    let storage = Storage::sqlite(&config.db_url).await?;
    tracing::debug!(db = %config.db_url, "storage ready");

    if let Command::Seed = cli.command {
        let summary = seed::run(&storage).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!(
                "seeded {} tools, {} articles, {} quiz questions",
                summary.tools, summary.articles, summary.questions
            );
        }
        return Ok(());
    }

    let news = NewsService::from_config(config.news.clone())?;
    if !news.enabled() {
        tracing::debug!("news disabled: no api key configured");
    }
    let auth = cli.user.map_or_else(AuthContext::anonymous, AuthContext::signed_in);
    let ctx = Ctx {
        services: AppServices::new(&storage, Clock::system(), news),
        auth,
        config,
        json: cli.json,
    };

    match cli.command {
        Command::Tools { list, sort } => commands::tools(&ctx, &list, sort).await,
        Command::Articles { list } => commands::articles(&ctx, &list).await,
        Command::News { query, sort, page } => commands::news(&ctx, &query, sort, page).await,
        Command::Save { item } => commands::save(&ctx, item).await,
        Command::Unsave { item } => commands::unsave(&ctx, item).await,
        Command::Saved => commands::saved(&ctx).await,
        Command::Quiz { article, answers } => commands::quiz(&ctx, article, &answers).await,
        Command::Stats { article } => commands::stats(&ctx, article).await,
        Command::Progress => commands::progress(&ctx).await,
        Command::Seed => Ok(()),
    }
}

/// Maps a failure to the message printed once and the exit status.
fn report(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ServiceError>().map(ServiceError::kind) {
        Some(ErrorKind::AlreadyExists) => {
            eprintln!("notice: {err}");
            1
        }
        Some(ErrorKind::Unauthenticated) => {
            eprintln!("{err}; pass --user <uuid> or set CATALOG_USER");
            2
        }
        _ => {
            eprintln!("{err:#}");
            2
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    if let Err(err) = run(cli).await {
        std::process::exit(report(&err));
    }
}
