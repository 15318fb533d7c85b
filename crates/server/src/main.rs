use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::{NewArticle, NewsItemId, SortAction},
    error::{ApiError, ApiException, ErrorCode},
    protocol::{ArticlePage, CreatedArticle},
};
use storage::Storage;
use tracing::{error, info};

mod api;
mod config;

use api::{
    create_article, export_selected_csv, list_articles, remove_from_display, select_for_download,
    sort_redirect_target, ApiContext, Listing, ALL_ARTICLES_ROUTE, ARTICLES_ROUTE,
    DOWNLOAD_FILE_NAME, SEARCH_ROUTE,
};
use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct DownloadSelection {
    #[serde(default)]
    is_selected_for_download: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        per_page: settings.per_page,
    };

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, per_page = settings.per_page, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(ARTICLES_ROUTE, get(http_list_on_display).post(http_create_article))
        .route(ALL_ARTICLES_ROUTE, get(http_list_all))
        .route(SEARCH_ROUTE, get(http_search))
        .route("/articles/download", get(http_download_selected))
        .route(
            "/articles/:id/remove-from-display",
            post(http_remove_from_display),
        )
        .route(
            "/articles/:id/select-for-download",
            post(http_select_for_download),
        )
        .route("/sort/:action", get(http_apply_sort))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %e, "health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_list_on_display(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ArticlePage>> {
    list_articles(&state.api, Listing::OnDisplay, query.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_list_all(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ArticlePage>> {
    list_articles(&state.api, Listing::All, query.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_search(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<ArticlePage>> {
    list_articles(&state.api, Listing::Search, query.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(error_response)
}

async fn http_create_article(
    State(state): State<Arc<AppState>>,
    Json(article): Json<NewArticle>,
) -> ApiResult<Json<CreatedArticle>> {
    let id = create_article(&state.api, &article)
        .await
        .map_err(error_response)?;
    info!(id = id.0, source = %article.source, "article created");
    Ok(Json(CreatedArticle { id }))
}

async fn http_remove_from_display(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_news_item_id(&id)?;
    remove_from_display(&state.api, id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_select_for_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(selection): Json<DownloadSelection>,
) -> ApiResult<StatusCode> {
    let id = parse_news_item_id(&id)?;
    select_for_download(&state.api, id, selection.is_selected_for_download)
        .await
        .map_err(error_response)?;
    info!(id = id.0, selected = selection.is_selected_for_download, "download selection changed");
    Ok(StatusCode::NO_CONTENT)
}

async fn http_download_selected(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let csv = export_selected_csv(&state.api)
        .await
        .map_err(error_response)?;
    let disposition = format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Path ids that are not integers get the same JSON error envelope as
/// every other failure.
fn parse_news_item_id(raw: &str) -> ApiResult<NewsItemId> {
    raw.parse::<i64>().map(NewsItemId).map_err(|_| {
        error_response(ApiError::new(
            ErrorCode::Validation,
            format!("invalid news item id: {raw}"),
        ))
    })
}

/// Applies a sort action to the request's own query and redirects to the
/// listing, for clients that cannot rewrite the URL themselves.
async fn http_apply_sort(
    Path(action): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Redirect> {
    let action = action
        .parse::<SortAction>()
        .map_err(|e| error_response(ApiException::from(e).into()))?;
    let target = sort_redirect_target(action, query.as_deref().unwrap_or_default());
    info!(%action, %target, "sort redirect");
    Ok(Redirect::to(&target))
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
