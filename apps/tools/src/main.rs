use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use shared::{
    domain::{NewArticle, SortAction},
    protocol::ActiveSort,
};
use sort_state::{apply_sort_to_url, HistoryNavigator, SortController, SortState};
use storage::{NewsItemFilter, Storage};
use url::{ParseError, Position, Url};

const RELATIVE_BASE: &str = "http://localhost/";

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://newsdesk.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the URL a sort action navigates to.
    Apply {
        #[arg(long)]
        url: String,
        action: SortAction,
    },
    /// Replay clicks on page controls, printing each navigation.
    Click {
        #[arg(long)]
        url: String,
        controls: Vec<String>,
    },
    /// Print the sort state carried by a URL.
    State {
        #[arg(long)]
        url: String,
    },
    Seed {
        #[arg(long)]
        source: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        published_at: DateTime<Utc>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        google_search: Option<String>,
    },
    List {
        #[arg(long)]
        all: bool,
        /// Only items whose title or summary contains this text.
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        sort: Option<SortAction>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 15)]
        per_page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Apply { url, action } => {
            println!("{}", apply(&url, action)?);
        }
        Command::Click { url, controls } => {
            for line in click(&url, &controls)? {
                println!("{line}");
            }
        }
        Command::State { url } => {
            let (url, _) = resolve(&url)?;
            println!("{}", serde_json::to_string_pretty(&SortState::from_url(&url))?);
        }
        Command::Seed {
            source,
            title,
            url,
            published_at,
            summary,
            google_search,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let id = storage
                .insert_news_item(&NewArticle {
                    source,
                    title,
                    url,
                    published_at,
                    summary,
                    google_search,
                })
                .await?;
            println!("stored news_item_id={}", id.0);
        }
        Command::List {
            all,
            query,
            sort,
            page,
            per_page,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let filter = NewsItemFilter {
                query,
                include_removed: all,
                ..NewsItemFilter::default()
            };
            let sort = sort.map(ActiveSort::from);
            let items = storage
                .list_news_items(&filter, sort, page.max(1), per_page.max(1))
                .await?;
            for item in items {
                println!(
                    "{}\t{}\t{}\t{}",
                    item.id.0,
                    item.published_at.format("%Y-%m-%d"),
                    item.source,
                    item.title
                );
            }
        }
    }

    Ok(())
}

/// Parses `raw`, accepting paths such as `/articles?page=2`.
fn resolve(raw: &str) -> Result<(Url, bool)> {
    match Url::parse(raw) {
        Ok(url) => Ok((url, false)),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE)?;
            let url = base
                .join(raw)
                .with_context(|| format!("invalid relative url '{raw}'"))?;
            Ok((url, true))
        }
        Err(e) => Err(e).with_context(|| format!("invalid url '{raw}'")),
    }
}

fn render(url: &Url, relative: bool) -> String {
    if relative {
        url[Position::BeforePath..].to_string()
    } else {
        url.to_string()
    }
}

fn apply(raw: &str, action: SortAction) -> Result<String> {
    let (url, relative) = resolve(raw)?;
    Ok(render(&apply_sort_to_url(&url, action), relative))
}

fn click(raw: &str, controls: &[String]) -> Result<Vec<String>> {
    let (url, relative) = resolve(raw)?;
    let mut controller = SortController::new(HistoryNavigator::new(url));
    Ok(controls
        .iter()
        .map(|control| match controller.handle(control) {
            Some(target) => format!("{control} -> {}", render(&target, relative)),
            None => format!("{control} -> (no sort action)"),
        })
        .collect())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
