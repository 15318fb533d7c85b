use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
};
use tower::ServiceExt;

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage: storage.clone(),
        per_page: 2,
    };
    let app = build_router(Arc::new(AppState { api }));
    (app, storage)
}

async fn post_article(app: &Router, title: &str, published_at: &str) -> CreatedArticle {
    let request = Request::post("/articles")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "source": "Reuters",
                "title": title,
                "url": format!("https://news.example/{title}"),
                "published_at": published_at,
            })
            .to_string(),
        ))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json")
}

async fn get_page(app: &Router, uri: &str) -> ArticlePage {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn created_articles_are_listed_sorted_and_paginated() {
    let (app, _storage) = test_app().await;
    post_article(&app, "b-story", "2024-01-02T00:00:00Z").await;
    post_article(&app, "a-story", "2024-01-03T00:00:00Z").await;
    post_article(&app, "c-story", "2024-01-01T00:00:00Z").await;

    let page = get_page(&app, "/articles?sort_title=desc").await;
    let titles: Vec<&str> = page.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["c-story", "b-story"]);
    assert_eq!(page.total_pages, 2);
    assert_eq!(
        page.links.next.as_deref(),
        Some("/articles?sort_title=desc&page=2")
    );

    let second = get_page(&app, "/articles?sort_date=asc&page=2").await;
    let titles: Vec<&str> = second.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["a-story"]);
}

#[tokio::test]
async fn sort_route_redirects_to_canonical_listing() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/sort/date-asc?foo=bar&sort_title=asc&page=3")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/articles?foo=bar&sort_date=asc")
    );
}

#[tokio::test]
async fn sort_route_rejects_unknown_action() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/sort/size-asc")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let err: ApiError = serde_json::from_slice(&body).expect("json");
    assert!(matches!(err.code, ErrorCode::Validation));
}

#[tokio::test]
async fn remove_from_display_hides_article() {
    let (app, storage) = test_app().await;
    let created = post_article(&app, "gone", "2024-01-01T00:00:00Z").await;

    let request = Request::post(format!("/articles/{}/remove-from-display", created.id.0))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(get_page(&app, "/articles").await.total_count, 0);
    assert_eq!(get_page(&app, "/articles/all").await.total_count, 1);
    let stored = storage
        .get_news_item(created.id)
        .await
        .expect("get")
        .expect("item");
    assert!(stored.is_removed_from_display);

    let missing = Request::post("/articles/999/remove-from-display")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(missing).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_gets_json_validation_error() {
    let (app, _storage) = test_app().await;
    for uri in ["/articles/abc/remove-from-display", "/articles/1x/select-for-download"] {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"is_selected_for_download":true}"#))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");

        let body = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let err: ApiError = serde_json::from_slice(&body).expect("json");
        assert!(matches!(err.code, ErrorCode::Validation));
    }
}

#[tokio::test]
async fn search_route_filters_by_text() {
    let (app, _storage) = test_app().await;
    post_article(&app, "zoning-vote", "2024-01-02T00:00:00Z").await;
    post_article(&app, "rates-hold", "2024-01-03T00:00:00Z").await;
    post_article(&app, "Zoning-appeal", "2024-01-01T00:00:00Z").await;

    let page = get_page(&app, "/articles/search?query=ZONING&sort_date=desc").await;
    let titles: Vec<&str> = page.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["zoning-vote", "Zoning-appeal"]);
    assert_eq!(
        page.links.sort.title_asc,
        "/articles/search?query=ZONING&sort_title=asc"
    );

    let request = Request::get("/articles/search")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn selected_articles_download_as_csv() {
    let (app, _storage) = test_app().await;
    let kept = post_article(&app, "kept", "2024-01-02T00:00:00Z").await;
    post_article(&app, "skipped", "2024-01-03T00:00:00Z").await;

    let request = Request::post(format!("/articles/{}/select-for-download", kept.id.0))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"is_selected_for_download":true}"#))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let missing = Request::post("/articles/999/select-for-download")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .expect("request");
    let response = app.clone().oneshot(missing).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::get("/articles/download")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"selected_articles.csv\"")
    );
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let csv = String::from_utf8(body.to_vec()).expect("utf8");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].contains(",kept,https://news.example/kept,"));
}
