use serde::Serialize;
use shared::{
    domain::{
        NewArticle, NewsItem, NewsItemId, SortAction, GOOGLE_SEARCH_PARAM, SEARCH_QUERY_PARAM,
        SOURCE_PARAM,
    },
    error::{ApiError, ErrorCode},
    protocol::{ArticlePage, PageLinks, SortLinks},
};
use sort_state::{apply_action, with_page, QueryParams, SortState};
use storage::{NewsItemFilter, Storage};
use tracing::error;

pub const ARTICLES_ROUTE: &str = "/articles";
pub const ALL_ARTICLES_ROUTE: &str = "/articles/all";
pub const SEARCH_ROUTE: &str = "/articles/search";
pub const DOWNLOAD_FILE_NAME: &str = "selected_articles.csv";

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub per_page: u32,
}

/// Which listing a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    OnDisplay,
    All,
    /// Items on display whose title or summary contains `query`.
    Search,
}

impl Listing {
    fn path(self) -> &'static str {
        match self {
            Listing::OnDisplay => ARTICLES_ROUTE,
            Listing::All => ALL_ARTICLES_ROUTE,
            Listing::Search => SEARCH_ROUTE,
        }
    }
}

pub async fn list_articles(
    ctx: &ApiContext,
    listing: Listing,
    query: &str,
) -> Result<ArticlePage, ApiError> {
    let params = QueryParams::parse(query);
    let state = SortState::from_params(&params);
    let sort = state.active();
    let page = state.page_or_first();
    let filter = NewsItemFilter {
        source: non_empty(params.get(SOURCE_PARAM)),
        google_search: non_empty(params.get(GOOGLE_SEARCH_PARAM)),
        query: non_empty(params.get(SEARCH_QUERY_PARAM)),
        include_removed: listing == Listing::All,
    };
    if listing == Listing::Search && filter.query.is_none() {
        return Err(ApiError::new(ErrorCode::Validation, "query cannot be empty"));
    }

    let total_count = ctx
        .storage
        .count_news_items(&filter)
        .await
        .map_err(internal)?;
    let items = ctx
        .storage
        .list_news_items(&filter, sort, page, ctx.per_page)
        .await
        .map_err(internal)?;
    let sources = ctx
        .storage
        .list_sources(&filter)
        .await
        .map_err(internal)?;

    let total_pages = total_pages(total_count, ctx.per_page);
    Ok(ArticlePage {
        items,
        page,
        per_page: ctx.per_page,
        total_count,
        total_pages,
        sort,
        sources,
        links: page_links(listing.path(), query, page, total_pages),
    })
}

pub async fn create_article(ctx: &ApiContext, article: &NewArticle) -> Result<NewsItemId, ApiError> {
    if article.title.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "title cannot be empty"));
    }
    if article.url.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "url cannot be empty"));
    }
    if article.source.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "source cannot be empty"));
    }
    ctx.storage
        .insert_news_item(article)
        .await
        .map_err(internal)
}

pub async fn remove_from_display(ctx: &ApiContext, id: NewsItemId) -> Result<(), ApiError> {
    let updated = ctx
        .storage
        .set_removed_from_display(id, true)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "news item not found"));
    }
    Ok(())
}

pub async fn select_for_download(
    ctx: &ApiContext,
    id: NewsItemId,
    selected: bool,
) -> Result<(), ApiError> {
    let updated = ctx
        .storage
        .set_selected_for_download(id, selected)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "news item not found"));
    }
    Ok(())
}

#[derive(Serialize)]
struct DownloadRow<'a> {
    id: i64,
    source: &'a str,
    title: &'a str,
    url: &'a str,
    published_at: String,
    summary: Option<&'a str>,
    google_search: Option<&'a str>,
}

impl<'a> From<&'a NewsItem> for DownloadRow<'a> {
    fn from(item: &'a NewsItem) -> Self {
        Self {
            id: item.id.0,
            source: &item.source,
            title: &item.title,
            url: &item.url,
            published_at: item.published_at.to_rfc3339(),
            summary: item.summary.as_deref(),
            google_search: item.google_search.as_deref(),
        }
    }
}

/// CSV of every item selected for download, header row first.
pub async fn export_selected_csv(ctx: &ApiContext) -> Result<String, ApiError> {
    let items = ctx
        .storage
        .list_selected_for_download()
        .await
        .map_err(internal)?;
    render_csv(&items).map_err(internal)
}

fn render_csv(items: &[NewsItem]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if items.is_empty() {
        writer.write_record([
            "id",
            "source",
            "title",
            "url",
            "published_at",
            "summary",
            "google_search",
        ])?;
    }
    for item in items {
        writer.serialize(DownloadRow::from(item))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("flushing csv failed: {}", err.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Listing location after `action`, for the no-script sort route.
pub fn sort_redirect_target(action: SortAction, query: &str) -> String {
    format!("{ARTICLES_ROUTE}?{}", apply_action(query, action))
}

fn page_links(path: &str, query: &str, page: u32, total_pages: u64) -> PageLinks {
    // A page past the end links back to the last real page.
    let last_page = u32::try_from(total_pages.max(1)).unwrap_or(u32::MAX);
    let prev = (page > 1)
        .then(|| format!("{path}?{}", with_page(query, (page - 1).min(last_page))));
    let next =
        (u64::from(page) < total_pages).then(|| format!("{path}?{}", with_page(query, page + 1)));
    let sort_link = |action| format!("{path}?{}", apply_action(query, action));
    PageLinks {
        prev,
        next,
        sort: SortLinks {
            date_asc: sort_link(SortAction::DateAsc),
            date_desc: sort_link(SortAction::DateDesc),
            title_asc: sort_link(SortAction::TitleAsc),
            title_desc: sort_link(SortAction::TitleDesc),
        },
    }
}

fn total_pages(total_count: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    total_count.div_ceil(per_page)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "storage failure");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
