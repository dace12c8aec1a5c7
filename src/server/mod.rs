//! HTTP server: JSON API, live blog pages and the generated static site
//!
//! The store is loaded in the background when the server starts. Until the
//! load finishes every route answers from the empty, loading store: the API
//! reports `loading: true` and pages show the loading indicator.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::content::Post;
use crate::generator::Generator;
use crate::query::{paginate, sort_posts, PostFilter, SortKey, SortOrder};
use crate::store::{PostStore, StoreHandle};
use crate::templates::{BlogFilter, SiteRenderer};
use crate::Blog;

/// Page size used when neither the request nor the config sets one
const DEFAULT_LIMIT: usize = 10;

/// Largest page size a client may ask for
const MAX_LIMIT: usize = 100;

/// Shared server state
pub struct AppState {
    store: StoreHandle,
    renderer: SiteRenderer,
    public_dir: PathBuf,
}

impl AppState {
    pub fn new(store: StoreHandle, renderer: SiteRenderer, public_dir: PathBuf) -> Self {
        Self {
            store,
            renderer,
            public_dir,
        }
    }

    fn default_limit(&self) -> usize {
        match self.renderer.config().per_page {
            0 => DEFAULT_LIMIT,
            n => n.min(MAX_LIMIT),
        }
    }
}

/// Response envelope shared by every API route
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
    /// True while the post set is still being fetched
    pub loading: bool,
}

impl<T> ApiResponse<T> {
    fn ok(message: &str, data: T, store: &PostStore) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            error: None,
            meta: None,
            loading: store.is_loading(),
        }
    }

    fn not_found(message: &str, error: &str, store: &PostStore) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            error: Some(error.to_string()),
            meta: None,
            loading: store.is_loading(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Query string of `GET /api/v1/posts`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub search: String,
    pub tag: String,
    pub author: String,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    /// `created_at`, `updated_at`, `view_count` or `read_time`. Without it
    /// posts keep store order.
    pub sort: Option<String>,
    /// `asc` or `desc` (default)
    pub order: String,
}

impl ListParams {
    fn sort_key(&self) -> Option<SortKey> {
        let key = match self.sort.as_deref()?.trim() {
            "" => return None,
            "updated_at" => SortKey::UpdatedAt,
            "view_count" => SortKey::ViewCount,
            "read_time" => SortKey::ReadTime,
            // Anything else, `created_at` included, sorts by publication
            _ => SortKey::PublishedAt,
        };
        Some(key)
    }

    fn sort_order(&self) -> SortOrder {
        if self.order.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// One entry of `GET /api/v1/tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// A page that failed to render
struct PageError(anyhow::Error);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("Failed to render page: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

/// Build the application router over `state`
pub fn router(state: AppState) -> Router {
    let public_dir = state.public_dir.clone();
    let static_files = ServeDir::new(&public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/api/v1/posts", get(list_posts))
        .route("/api/v1/posts/:key", get(get_post))
        .route("/api/v1/tags", get(list_tags))
        .route("/blog", get(blog_page))
        .route("/blog/", get(blog_page))
        .route("/blog/:key", get(post_page))
        .route("/blog/:key/", get(post_page))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start loading posts and serve until the process is stopped.
///
/// Once the load finishes the static site is regenerated from the loaded
/// store, so the fallback files match what the API serves.
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let store = StoreHandle::spawn(blog.source()?);
    let state = AppState::new(store.clone(), blog.renderer()?, blog.public_dir.clone());

    let generator = Generator::new(blog)?;
    tokio::spawn(async move {
        let loaded = store.wait_loaded().await;
        match generator.generate(&loaded, Utc::now()) {
            Ok(stats) => tracing::info!(
                "Generated {} files for {} posts",
                stats.files,
                stats.posts
            ),
            Err(e) => tracing::error!("Generation failed: {:#}", e),
        }
    });

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("API available at http://{}:{}/api/v1/posts", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// `GET /api/v1/posts`: filtered, paginated post list
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let store = state.store.current();
    let filter = PostFilter {
        search: &params.search,
        tag: &params.tag,
        author: &params.author,
    };
    let mut matching = store.query().filter(&filter);
    if let Some(key) = params.sort_key() {
        sort_posts(&mut matching, key, params.sort_order());
    }

    let limit = params
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or_else(|| state.default_limit())
        .min(MAX_LIMIT);
    let page = paginate(&matching, params.page.unwrap_or(1), limit);

    let mut response = ApiResponse::ok("Posts fetched successfully", page.posts, &store);
    response.meta = Some(PaginationMeta {
        page: page.page,
        limit: page.per_page,
        total: page.total,
        total_pages: page.total_pages,
    });
    Json(response).into_response()
}

/// `GET /api/v1/posts/:key`: one post by key, or by id
async fn get_post(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    let store = state.store.current();
    match store.query().resolve(&key) {
        Some(post) => Json(ApiResponse::ok("Post fetched successfully", post, &store)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Post>::not_found("Post not found", "post_not_found", &store)),
        )
            .into_response(),
    }
}

/// `GET /api/v1/tags`: every tag with its post count, most used first
async fn list_tags(State(state): State<Arc<AppState>>) -> Response {
    let store = state.store.current();
    let tags: Vec<TagCount> = store
        .query()
        .tag_counts()
        .into_iter()
        .map(|(name, count)| TagCount { name, count })
        .collect();
    Json(ApiResponse::ok("Tags fetched successfully", tags, &store)).into_response()
}

/// `GET /blog?search=..&tag=..`
async fn blog_page(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BlogFilter>,
) -> Result<Html<String>, PageError> {
    let store = state.store.current();
    Ok(Html(state.renderer.blog(&store, &filter, Utc::now())?))
}

/// `GET /blog/:key`. Unknown keys get the not-found page, except while the
/// store is still loading.
async fn post_page(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, PageError> {
    let store = state.store.current();
    let now = Utc::now();

    if let Some(post) = store.query().resolve(&key) {
        return Ok(Html(state.renderer.post(&store, post, now)?).into_response());
    }

    let page = Html(state.renderer.not_found(&store, now)?);
    if store.is_loading() {
        Ok(page.into_response())
    } else {
        Ok((StatusCode::NOT_FOUND, page).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::source::{BundledSource, HttpSource, PostSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Duration, TimeZone};
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn post(id: &str, title: &str, author: &str, tags: &[&str]) -> Post {
        let day = id.parse::<i64>().unwrap_or(1);
        let mut post = Post::new(
            id,
            title,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
        );
        post.excerpt = format!("About {}", title);
        post.author = author.to_string();
        post.read_time = 5;
        post.tags = tags.iter().map(|t| t.to_string()).collect();
        post
    }

    fn sample_store() -> PostStore {
        PostStore::from_posts(vec![
            post("1", "Go Microservices", "Alice", &["Go", "Backend"]),
            post("2", "React 18", "Bob", &["React", "Frontend"]),
            post("3", "Go Generics", "Bob", &["Go"]),
        ])
    }

    fn app_with(store: StoreHandle, public_dir: PathBuf, per_page: usize) -> Router {
        let config = SiteConfig {
            per_page,
            ..SiteConfig::default()
        };
        let renderer = SiteRenderer::new(&config).unwrap();
        router(AppState::new(store, renderer, public_dir))
    }

    fn app(store: PostStore) -> Router {
        app_with(StoreHandle::ready(store), PathBuf::from("does-not-exist"), 10)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    fn ids(value: &serde_json::Value) -> Vec<&str> {
        value["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_list_posts_envelope() {
        let (status, json) = get_json(app(sample_store()), "/api/v1/posts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Posts fetched successfully");
        assert_eq!(json["loading"], false);
        assert_eq!(ids(&json), vec!["1", "2", "3"]);
        assert_eq!(
            json["meta"],
            serde_json::json!({"page": 1, "limit": 10, "total": 3, "totalPages": 1})
        );
        assert_eq!(json["data"][0]["slug"], "go-microservices");
        assert_eq!(json["data"][0]["publishedAt"], "2024-01-02T00:00:00Z");
    }

    #[tokio::test]
    async fn test_list_posts_filters() {
        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?tag=Go").await;
        assert_eq!(ids(&json), vec!["1", "3"]);

        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?search=REACT").await;
        assert_eq!(ids(&json), vec!["2"]);

        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?tag=Go&author=bob").await;
        assert_eq!(ids(&json), vec!["3"]);

        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?search=generics%20go").await;
        assert!(ids(&json).is_empty());
        assert_eq!(json["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn test_list_posts_pagination() {
        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?page=2&limit=2").await;
        assert_eq!(ids(&json), vec!["3"]);
        assert_eq!(
            json["meta"],
            serde_json::json!({"page": 2, "limit": 2, "total": 3, "totalPages": 2})
        );

        // Past the end is an empty page, zero page is the first
        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?page=9&limit=2").await;
        assert!(ids(&json).is_empty());
        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?page=0&limit=1").await;
        assert_eq!(ids(&json), vec!["1"]);

        // Oversized limits are capped
        let (_, json) = get_json(app(sample_store()), "/api/v1/posts?limit=5000").await;
        assert_eq!(json["meta"]["limit"], MAX_LIMIT);
    }

    #[tokio::test]
    async fn test_list_posts_sorting() {
        let mut posts = vec![
            post("1", "Go Microservices", "Alice", &["Go"]),
            post("2", "React 18", "Bob", &["React"]),
            post("3", "Go Generics", "Bob", &["Go"]),
        ];
        posts[0].view_count = Some(50);
        posts[1].view_count = Some(10);
        posts[2].view_count = Some(30);
        posts[1].read_time = 12;
        let store = || PostStore::from_posts(posts.clone());

        let (_, json) = get_json(app(store()), "/api/v1/posts?sort=view_count").await;
        assert_eq!(ids(&json), vec!["1", "3", "2"]);

        let (_, json) = get_json(app(store()), "/api/v1/posts?sort=view_count&order=asc").await;
        assert_eq!(ids(&json), vec!["2", "3", "1"]);

        let (_, json) = get_json(app(store()), "/api/v1/posts?sort=created_at").await;
        assert_eq!(ids(&json), vec!["3", "2", "1"]);

        let (_, json) = get_json(app(store()), "/api/v1/posts?sort=read_time&tag=Go&order=ASC").await;
        assert_eq!(ids(&json), vec!["1", "3"]);

        // Unknown fields fall back to newest first
        let (_, json) = get_json(app(store()), "/api/v1/posts?sort=title").await;
        assert_eq!(ids(&json), vec!["3", "2", "1"]);

        // Sorting happens before pagination
        let (_, json) = get_json(app(store()), "/api/v1/posts?sort=view_count&limit=1&page=2").await;
        assert_eq!(ids(&json), vec!["3"]);
    }

    #[tokio::test]
    async fn test_default_limit_follows_config() {
        let app = app_with(StoreHandle::ready(sample_store()), PathBuf::from("."), 2);
        let (_, json) = get_json(app, "/api/v1/posts").await;
        assert_eq!(ids(&json), vec!["1", "2"]);
        assert_eq!(json["meta"]["totalPages"], 2);
    }

    #[tokio::test]
    async fn test_get_post_by_key_or_id() {
        let (status, json) = get_json(app(sample_store()), "/api/v1/posts/react-18").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], "2");

        let (status, json) = get_json(app(sample_store()), "/api/v1/posts/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["slug"], "go-generics");
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let (status, json) = get_json(app(sample_store()), "/api/v1/posts/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Post not found");
        assert_eq!(json["error"], "post_not_found");
        assert!(json["data"].is_null());
        assert!(json.get("meta").is_none());
    }

    #[tokio::test]
    async fn test_list_tags() {
        let (_, json) = get_json(app(sample_store()), "/api/v1/tags").await;
        assert_eq!(
            json["data"],
            serde_json::json!([
                {"name": "Go", "count": 2},
                {"name": "Backend", "count": 1},
                {"name": "Frontend", "count": 1},
                {"name": "React", "count": 1}
            ])
        );
    }

    #[tokio::test]
    async fn test_loading_store() {
        let app = app_with(
            StoreHandle::ready(PostStore::pending()),
            PathBuf::from("."),
            10,
        );

        let (status, json) = get_json(app.clone(), "/api/v1/posts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["loading"], true);
        assert!(ids(&json).is_empty());

        // Unknown keys are not a 404 until the load is done
        let (status, body) = get(app, "/blog/go-microservices/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("class=\"loading\""));
    }

    #[tokio::test]
    async fn test_blog_pages() {
        let (status, body) = get(app(sample_store()), "/blog/?tag=React").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("React 18"));
        assert!(!body.contains("Go Generics"));

        let (status, body) = get(app(sample_store()), "/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Go Generics"));

        let (status, body) = get(app(sample_store()), "/blog/go-generics/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1 class=\"post-title\">Go Generics</h1>"));

        let (status, _) = get(app(sample_store()), "/blog/go-generics").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(app(sample_store()), "/blog/missing/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("about")).unwrap();
        std::fs::write(tmp.path().join("about/index.html"), "<p>about</p>").unwrap();
        std::fs::write(tmp.path().join("404.html"), "<p>gone</p>").unwrap();

        let store = StoreHandle::ready(sample_store());
        let app = app_with(store, tmp.path().to_path_buf(), 10);

        let (status, body) = get(app.clone(), "/about/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<p>about</p>");

        let (status, body) = get(app, "/nowhere.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "<p>gone</p>");
    }

    #[tokio::test]
    async fn test_api_round_trips_through_http_source() {
        let source = BundledSource::sample().unwrap();
        let store = PostStore::load(&source).await;
        assert!(!store.is_empty());
        let expected = store.posts().to_vec();

        let app = app(store);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let remote = HttpSource::new(
            &format!("http://{}/api/v1", addr),
            StdDuration::from_secs(5),
        )
        .unwrap();
        let fetched = remote.fetch().await.unwrap();
        assert_eq!(fetched, expected);
    }
}
