use clap::{Args, Parser, Subcommand};

use catalog_core::listing::SortKey;
use catalog_core::model::{ArticleId, ItemId, QuestionId, UserId};
use services::NewsSortKey;
use services::news_service::{DEFAULT_NEWS_BASE_URL, DEFAULT_NEWS_QUERY};

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "AI tool catalog and learning quizzes")]
pub struct Cli {
    /// SQLite database url or path
    #[arg(long = "db", env = "CATALOG_DB_URL", default_value = "sqlite://catalog.sqlite3")]
    pub db_url: String,

    /// Signed-in user id; omit to stay signed out
    #[arg(long, env = "CATALOG_USER")]
    pub user: Option<UserId>,

    /// Rows per page (defaults: 6 tools, 5 articles, 5 news)
    #[arg(long, env = "CATALOG_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "CATALOG_LOG", default_value = "info")]
    pub log: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub news: NewsArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct NewsArgs {
    #[arg(long = "news-api-key", env = "CATALOG_NEWS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(
        long = "news-base-url",
        env = "CATALOG_NEWS_BASE_URL",
        default_value = DEFAULT_NEWS_BASE_URL
    )]
    pub base_url: String,

    #[arg(long = "news-timeout-secs", env = "CATALOG_NEWS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive title search
    #[arg(long, short, default_value = "")]
    pub query: String,

    /// Exact facet value; empty or "all" shows everything
    #[arg(long, short, default_value = "")]
    pub facet: String,

    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List catalog tools
    Tools {
        #[command(flatten)]
        list: ListArgs,

        /// "" or "popularity"
        #[arg(long, default_value = "")]
        sort: SortKey,
    },

    /// List learning articles (facet = difficulty)
    Articles {
        #[command(flatten)]
        list: ListArgs,
    },

    /// Page through external news
    News {
        #[arg(long, short, default_value = DEFAULT_NEWS_QUERY)]
        query: String,

        /// relevancy, popularity or publishedAt
        #[arg(long, default_value = "publishedAt")]
        sort: NewsSortKey,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Save a tool for the signed-in user
    Save { item: ItemId },

    /// Remove a saved tool
    Unsave { item: ItemId },

    /// List the signed-in user's saved tools
    Saved,

    /// Show an article's quiz, or submit answers with --answer
    Quiz {
        article: ArticleId,

        /// QUESTION=OPTION, repeatable
        #[arg(long = "answer", short, value_parser = parse_answer)]
        answers: Vec<(QuestionId, String)>,
    },

    /// Attempt counters of an article's quiz
    Stats { article: ArticleId },

    /// The signed-in user's quiz results
    Progress,

    /// Load demo tools, articles and quizzes
    Seed,
}

fn parse_answer(raw: &str) -> Result<(QuestionId, String), String> {
    let (question, option) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=OPTION, got {raw:?}"))?;
    let question = question
        .parse::<QuestionId>()
        .map_err(|e| e.to_string())?;
    let option = option.trim();
    if option.is_empty() {
        return Err(format!("missing option for question {question}"));
    }
    Ok((question, option.to_owned()))
}
