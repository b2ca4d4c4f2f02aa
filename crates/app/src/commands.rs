use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use catalog_core::listing::{FacetFilter, ListState, PageInfo, SortKey};
use catalog_core::model::{ArticleId, ItemId, QuestionId, QuizOutcome};
use services::{AppServices, AuthContext, NewsQuery, NewsSortKey};

use crate::cli::ListArgs;
use crate::config::{ARTICLES_PAGE_SIZE, AppConfig, NEWS_PAGE_SIZE, TOOLS_PAGE_SIZE};

/// Everything a subcommand needs.
pub struct Ctx {
    pub services: AppServices,
    pub auth: AuthContext,
    pub config: AppConfig,
    pub json: bool,
}

impl Ctx {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

fn list_state(args: &ListArgs, page_size: usize) -> ListState {
    let mut state = ListState::new(page_size);
    state.set_query(args.query.as_str());
    state.set_facet(FacetFilter::from_param(&args.facet));
    state
}

fn page_footer(info: &PageInfo) {
    let window: Vec<String> = info
        .window
        .iter()
        .map(|n| {
            if *n == info.current_page {
                format!("[{n}]")
            } else {
                n.to_string()
            }
        })
        .collect();
    println!(
        "page {} of {} ({} rows)  {}{}{}",
        info.current_page,
        info.total_pages,
        info.total_items,
        if info.has_previous() { "< " } else { "" },
        window.join(" "),
        if info.has_next() { " >" } else { "" },
    );
}

pub async fn tools(ctx: &Ctx, args: &ListArgs, sort: SortKey) -> Result<()> {
    let store = ctx.services.catalog().tool_store().await?;
    let saved: HashSet<ItemId> = if ctx.auth.is_authenticated() {
        ctx.services.saves().saved_by_user(&ctx.auth).await?
    } else {
        HashSet::new()
    };

    let mut state = list_state(args, ctx.config.page_size_or(TOOLS_PAGE_SIZE));
    state.set_sort(sort);
    let matches = store.matching(&state).len();
    state.go_to(args.page, matches);
    let page = store.render(&state);

    let rows: Vec<_> = page
        .items
        .iter()
        .map(|item| {
            json!({
                "item": item,
                "saves": store.popularity_of(&item.id()),
                "saved": saved.contains(&item.id()),
            })
        })
        .collect();
    let body = json!({ "facets": store.facets(), "rows": rows, "page": page.info });

    ctx.emit(&body, || {
        println!("categories: {}", store.facets().join(", "));
        for item in &page.items {
            let mark = if saved.contains(&item.id()) { "*" } else { " " };
            println!(
                "{mark} {:>3}  {:<24} {:<8} {:<9} saves={}  {}",
                item.id(),
                item.title(),
                item.category(),
                item.price(),
                store.popularity_of(&item.id()),
                item.link(),
            );
        }
        if page.items.is_empty() {
            println!("no tools match");
        }
        page_footer(&page.info);
    })
}

pub async fn articles(ctx: &Ctx, args: &ListArgs) -> Result<()> {
    let store = ctx.services.catalog().article_store().await?;
    let passed = if ctx.auth.is_authenticated() {
        ctx.services.assessment().passed_articles(&ctx.auth).await?
    } else {
        HashSet::new()
    };

    let mut state = list_state(args, ctx.config.page_size_or(ARTICLES_PAGE_SIZE));
    let matches = store.matching(&state).len();
    state.go_to(args.page, matches);
    let page = store.render(&state);

    let rows: Vec<_> = page
        .items
        .iter()
        .map(|a| json!({ "article": a, "passed": passed.contains(&a.id()) }))
        .collect();
    let body = json!({ "difficulties": store.facets(), "rows": rows, "page": page.info });

    ctx.emit(&body, || {
        for article in &page.items {
            let mark = if passed.contains(&article.id()) { "✓" } else { " " };
            println!(
                "{mark} {:>3}  {:<36} {:<12} by {}",
                article.id(),
                article.title(),
                article.difficulty().as_str(),
                article.author(),
            );
            println!("       {}", article.excerpt(80));
        }
        if page.items.is_empty() {
            println!("no articles match");
        }
        page_footer(&page.info);
    })
}

pub async fn news(ctx: &Ctx, query: &str, sort: NewsSortKey, page: usize) -> Result<()> {
    let request = NewsQuery::new(query, ctx.config.page_size_or(NEWS_PAGE_SIZE), page.max(1))
        .sorted_by(sort);
    let page = ctx.services.news().page(&request).await?;

    ctx.emit(&page, || {
        for article in &page.articles {
            println!("- {} ({})", article.title, article.source_name);
            if let Some(description) = &article.description {
                println!("  {description}");
            }
            println!("  {}", article.url);
        }
        if page.articles.is_empty() {
            println!("no news on this page");
        }
        page_footer(&page.info);
    })
}

pub async fn save(ctx: &Ctx, item: ItemId) -> Result<()> {
    ctx.services.saves().save(&ctx.auth, item).await?;
    let saves = ctx.services.saves().count_for(item).await?;
    ctx.emit(&json!({ "item": item, "saved": true, "saves": saves }), || {
        println!("saved tool {item} ({saves} saves)");
    })
}

pub async fn unsave(ctx: &Ctx, item: ItemId) -> Result<()> {
    let removed = ctx.services.saves().delete(&ctx.auth, item).await?;
    ctx.emit(&json!({ "item": item, "removed": removed }), || {
        if removed {
            println!("removed tool {item} from saved tools");
        } else {
            println!("tool {item} was not saved");
        }
    })
}

pub async fn saved(ctx: &Ctx) -> Result<()> {
    let items = ctx.services.catalog().saved_tools(&ctx.auth).await?;
    ctx.emit(&items, || {
        if items.is_empty() {
            println!("no saved tools yet");
        }
        for item in &items {
            println!("{:>3}  {:<24} {}", item.id(), item.title(), item.link());
        }
    })
}

pub async fn quiz(ctx: &Ctx, article: ArticleId, answers: &[(QuestionId, String)]) -> Result<()> {
    let details = ctx.services.catalog().article(article).await?;
    let mut session = ctx.services.assessment().open(&ctx.auth, article).await?;

    if answers.is_empty() {
        let quiz = session.quiz();
        return ctx.emit(&json!({ "article": details, "questions": quiz.questions() }), || {
            println!("{} ({} questions)", details.title(), quiz.len());
            for question in quiz.questions() {
                println!("{}. {}", question.id(), question.text());
                for (key, label) in question.options() {
                    println!("   {key}) {label}");
                }
            }
            println!("answer with: catalog quiz {article} -a 1=<option> -a 2=<option> ...");
        });
    }

    for (question, key) in answers {
        session
            .choose(*question, key)
            .with_context(|| format!("answer {question}={key}"))?;
    }
    let outcome = ctx.services.assessment().submit(&ctx.auth, &mut session).await?;
    let stats = ctx.services.assessment().statistics(article).await?;

    ctx.emit(&json!({ "outcome": outcome, "statistics": stats }), || {
        print_outcome(&outcome);
        println!(
            "all attempts: {} passed of {} ({}%)",
            stats.successful_passes(),
            stats.total_attempts(),
            stats.pass_rate()
        );
    })
}

fn print_outcome(outcome: &QuizOutcome) {
    println!(
        "score {}% ({}/{}): {}",
        outcome.score,
        outcome.correct,
        outcome.total,
        if outcome.passed { "passed" } else { "not passed" }
    );
    for review in &outcome.review {
        let chosen = review.chosen.as_deref().unwrap_or("-");
        if review.is_correct {
            println!("  {}. {chosen} correct", review.question_id);
        } else {
            println!(
                "  {}. {chosen} wrong, answer is {}",
                review.question_id, review.correct_option
            );
        }
    }
}

pub async fn stats(ctx: &Ctx, article: ArticleId) -> Result<()> {
    let stats = ctx.services.assessment().statistics(article).await?;
    ctx.emit(&stats, || {
        println!(
            "article {article}: {} attempts, {} passes, pass rate {}%",
            stats.total_attempts(),
            stats.successful_passes(),
            stats.pass_rate()
        );
    })
}

pub async fn progress(ctx: &Ctx) -> Result<()> {
    let entries = ctx.services.assessment().progress_overview(&ctx.auth).await?;
    ctx.emit(&entries, || {
        if entries.is_empty() {
            println!("no quiz attempts yet");
        }
        for entry in &entries {
            println!(
                "{:>3}  {:<36} {:<10} {}",
                entry.article_id,
                entry.article_title,
                if entry.test_passed { "passed" } else { "not passed" },
                entry.updated_at.format("%Y-%m-%d %H:%M"),
            );
        }
    })
}
