use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use services::NewsConfig;

use crate::cli::{Cli, NewsArgs};

pub const TOOLS_PAGE_SIZE: usize = 6;
pub const ARTICLES_PAGE_SIZE: usize = 5;
pub const NEWS_PAGE_SIZE: usize = 5;

/// Settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub page_size: Option<usize>,
    pub news: Option<NewsConfig>,
}

impl AppConfig {
    /// # Errors
    ///
    /// Fails when the database url is blank.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.db_url.trim().is_empty() {
            bail!("invalid --db value: {:?}", cli.db_url);
        }
        Ok(Self {
            db_url: normalize_sqlite_url(&cli.db_url),
            page_size: cli.page_size.filter(|size| *size > 0),
            news: news_config(&cli.news),
        })
    }

    #[must_use]
    pub fn page_size_or(&self, default: usize) -> usize {
        self.page_size.unwrap_or(default)
    }
}

fn news_config(args: &NewsArgs) -> Option<NewsConfig> {
    let key = args.api_key.as_deref()?;
    NewsConfig::new(
        args.base_url.clone(),
        key,
        Duration::from_secs(args.timeout_secs.max(1)),
    )
}

/// Turns a bare or relative path into an absolute `sqlite://` url.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file and its parent directories if missing.
///
/// # Errors
///
/// Fails for a malformed url or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        tracing::info!(path = %path.display(), "created database file");
    }
    Ok(())
}
