use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{NewArticle, NewsItem, NewsItemId, SortAxis, SortDirection},
    protocol::ActiveSort,
};

const NEWS_ITEM_COLUMNS: &str = "id, source, title, url, published_at, summary, google_search,
     is_removed_from_display, is_selected_for_download";

// Bound in order by `bind_filter`.
const FILTER_WHERE: &str = "(? OR is_removed_from_display = 0)
       AND (? IS NULL OR source = ?)
       AND (? IS NULL OR google_search = ?)
       AND (? IS NULL
            OR instr(lower(title), lower(?)) > 0
            OR instr(lower(COALESCE(summary, '')), lower(?)) > 0)";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Narrowing applied before sorting and pagination.
#[derive(Debug, Clone, Default)]
pub struct NewsItemFilter {
    pub source: Option<String>,
    pub google_search: Option<String>,
    /// Case-insensitive substring of the title or summary.
    pub query: Option<String>,
    pub include_removed: bool,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts an article, or refreshes the stored one with the same url.
    pub async fn insert_news_item(&self, article: &NewArticle) -> Result<NewsItemId> {
        let rec = sqlx::query(
            "INSERT INTO news_items (source, title, url, published_at, summary, google_search)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(url) DO UPDATE SET
                source=excluded.source,
                title=excluded.title,
                published_at=excluded.published_at,
                summary=excluded.summary,
                google_search=excluded.google_search
             RETURNING id",
        )
        .bind(&article.source)
        .bind(&article.title)
        .bind(&article.url)
        .bind(article.published_at)
        .bind(&article.summary)
        .bind(&article.google_search)
        .fetch_one(&self.pool)
        .await?;
        let id = NewsItemId(rec.get::<i64, _>(0));
        debug!(id = id.0, url = %article.url, "stored news item");
        Ok(id)
    }

    pub async fn get_news_item(&self, id: NewsItemId) -> Result<Option<NewsItem>> {
        let sql = format!("SELECT {NEWS_ITEM_COLUMNS} FROM news_items WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(news_item_from_row))
    }

    /// One page of items, 1-based. Unsorted listings follow insertion order.
    pub async fn list_news_items(
        &self,
        filter: &NewsItemFilter,
        sort: Option<ActiveSort>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<NewsItem>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
        let sql = format!(
            "SELECT {NEWS_ITEM_COLUMNS}
             FROM news_items
             WHERE {FILTER_WHERE}
             ORDER BY {}
             LIMIT ? OFFSET ?",
            order_clause(sort)
        );
        let rows = bind_filter(sqlx::query(&sql), filter)
            .bind(i64::from(per_page))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(news_item_from_row).collect())
    }

    pub async fn count_news_items(&self, filter: &NewsItemFilter) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM news_items WHERE {FILTER_WHERE}");
        let row = bind_filter(sqlx::query(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>(0).max(0) as u64)
    }

    /// Distinct sources, sorted. Only the removal flag and the text query
    /// narrow this list; the source and google_search filters do not.
    pub async fn list_sources(&self, filter: &NewsItemFilter) -> Result<Vec<String>> {
        let unfiltered = NewsItemFilter {
            source: None,
            google_search: None,
            ..filter.clone()
        };
        let sql = format!(
            "SELECT DISTINCT source FROM news_items WHERE {FILTER_WHERE} ORDER BY source ASC"
        );
        let rows = bind_filter(sqlx::query(&sql), &unfiltered)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }

    /// Returns false when no item has this id.
    pub async fn set_removed_from_display(&self, id: NewsItemId, removed: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE news_items SET is_removed_from_display = ? WHERE id = ?")
            .bind(removed)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no item has this id.
    pub async fn set_selected_for_download(&self, id: NewsItemId, selected: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE news_items SET is_selected_for_download = ? WHERE id = ?")
            .bind(selected)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        debug!(id = id.0, selected, "updated download selection");
        Ok(result.rows_affected() > 0)
    }

    /// Every selected item in id order, removed ones included.
    pub async fn list_selected_for_download(&self) -> Result<Vec<NewsItem>> {
        let sql = format!(
            "SELECT {NEWS_ITEM_COLUMNS} FROM news_items
             WHERE is_selected_for_download = 1
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(news_item_from_row).collect())
    }
}

fn bind_filter<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    filter: &'q NewsItemFilter,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let source = filter.source.as_deref();
    let google_search = filter.google_search.as_deref();
    let text = filter.query.as_deref();
    query
        .bind(filter.include_removed)
        .bind(source)
        .bind(source)
        .bind(google_search)
        .bind(google_search)
        .bind(text)
        .bind(text)
        .bind(text)
}

fn sql_direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// Unsorted listings and ties fall back to id order.
fn order_clause(sort: Option<ActiveSort>) -> String {
    let Some(sort) = sort else {
        return "id ASC".to_owned();
    };
    let column = match sort.axis {
        SortAxis::Date => "published_at",
        SortAxis::Title => "title",
    };
    let mut clause = format!("{column} {}", sql_direction(sort.direction));
    if let (SortAxis::Title, Some(date)) = (sort.axis, sort.then_date) {
        clause.push_str(&format!(", published_at {}", sql_direction(date)));
    }
    clause.push_str(", id ASC");
    clause
}

fn news_item_from_row(r: &SqliteRow) -> NewsItem {
    NewsItem {
        id: NewsItemId(r.get::<i64, _>("id")),
        source: r.get::<String, _>("source"),
        title: r.get::<String, _>("title"),
        url: r.get::<String, _>("url"),
        published_at: r.get::<DateTime<Utc>, _>("published_at"),
        summary: r.get::<Option<String>, _>("summary"),
        google_search: r.get::<Option<String>, _>("google_search"),
        is_removed_from_display: r.get::<bool, _>("is_removed_from_display"),
        is_selected_for_download: r.get::<bool, _>("is_selected_for_download"),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
