//! HTTP admin API over the consistency manager and the article desk.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /health`
//! - `GET|POST /stories`, `GET|PATCH|DELETE /stories/:id`
//! - `GET|POST /stories/:id/chapters`, `GET /stories/:id/chapters/next-number`
//! - `GET|PATCH|DELETE /chapters/:id`
//! - `GET /activity?limit=`
//! - `GET|POST /articles`, `GET|PATCH|DELETE /articles/:id`
//!
//! Errors are returned as `{ "error": message }` with the status code of
//! [`PressError::status_code`]. Chapter writes answer with
//! `{ "data": ..., "warnings": [...] }`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use serial_press::{http, ArticleDesk, ConsistencyManager, InMemoryDocumentStore, PressConfig};
//!
//! let store = Arc::new(InMemoryDocumentStore::new().with_index("chapters", "storyId"));
//! let api = Arc::new(http::AdminApi::new(
//!     ConsistencyManager::new(store.clone(), PressConfig::default()),
//!     ArticleDesk::new(store),
//! ));
//!
//! http::serve(api, "0.0.0.0:3000").await?;
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::articles::ArticleDesk;
use crate::consistency::{ConsistencyManager, Outcome};
use crate::error::PressError;
use crate::model::{
    Article, ArticleChanges, Chapter, ChapterChanges, EditLogEntry, NewArticle, NewChapter,
    NewStory, Status, Story, StoryChanges, StoryId,
};

/// Shared state behind every route.
pub struct AdminApi {
    manager: ConsistencyManager,
    articles: ArticleDesk,
}

impl AdminApi {
    pub fn new(manager: ConsistencyManager, articles: ArticleDesk) -> Self {
        Self { manager, articles }
    }

    pub fn manager(&self) -> &ConsistencyManager {
        &self.manager
    }

    pub fn articles(&self) -> &ArticleDesk {
        &self.articles
    }
}

/// A [`PressError`] rendered as a JSON response.
pub struct ApiError(PressError);

impl From<PressError> for ApiError {
    fn from(err: PressError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;
type ApiState = State<Arc<AdminApi>>;

/// Build an axum `Router` serving the admin API.
pub fn router(api: Arc<AdminApi>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stories", get(list_stories).post(create_story))
        .route(
            "/stories/:id",
            get(get_story).patch(update_story).delete(delete_story),
        )
        .route(
            "/stories/:id/chapters",
            get(list_chapters).post(create_chapter),
        )
        .route("/stories/:id/chapters/next-number", get(next_chapter_number))
        .route(
            "/chapters/:id",
            get(get_chapter).patch(update_chapter).delete(delete_chapter),
        )
        .route("/activity", get(recent_activity))
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/:id",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .with_state(api)
}

/// Serve the admin API at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve(api: Arc<AdminApi>, addr: &str) -> Result<(), std::io::Error> {
    let app = router(api);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "admin api listening");
    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Default, Deserialize)]
struct StoryQuery {
    status: Option<Status>,
}

async fn list_stories(
    State(api): ApiState,
    Query(query): Query<StoryQuery>,
) -> ApiResult<Json<Vec<Story>>> {
    let stories = match query.status {
        Some(status) => api.manager.list_stories_by_status(status).await?,
        None => api.manager.list_stories().await?,
    };
    Ok(Json(stories))
}

async fn create_story(
    State(api): ApiState,
    Json(input): Json<NewStory>,
) -> ApiResult<(StatusCode, Json<Story>)> {
    let story = api.manager.create_story(input).await?;
    Ok((StatusCode::CREATED, Json(story)))
}

async fn get_story(State(api): ApiState, Path(id): Path<String>) -> ApiResult<Json<Story>> {
    Ok(Json(api.manager.get_story(&id).await?))
}

async fn update_story(
    State(api): ApiState,
    Path(id): Path<String>,
    Json(changes): Json<StoryChanges>,
) -> ApiResult<Json<Story>> {
    Ok(Json(api.manager.update_story(&id, changes).await?))
}

async fn delete_story(State(api): ApiState, Path(id): Path<String>) -> ApiResult<StatusCode> {
    api.manager.delete_story(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_chapters(
    State(api): ApiState,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Chapter>>> {
    Ok(Json(api.manager.list_chapters(&id).await?))
}

/// The story in the path wins over any `storyId` in the body.
async fn create_chapter(
    State(api): ApiState,
    Path(id): Path<String>,
    Json(mut input): Json<NewChapter>,
) -> ApiResult<(StatusCode, Json<Outcome<Chapter>>)> {
    input.story_id = StoryId::new(id);
    let outcome = api.manager.create_chapter(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn next_chapter_number(
    State(api): ApiState,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let next = api.manager.next_chapter_number(&id).await?;
    Ok(Json(json!({ "chapterNumber": next })))
}

async fn get_chapter(State(api): ApiState, Path(id): Path<String>) -> ApiResult<Json<Chapter>> {
    Ok(Json(api.manager.get_chapter(&id).await?))
}

async fn update_chapter(
    State(api): ApiState,
    Path(id): Path<String>,
    Json(changes): Json<ChapterChanges>,
) -> ApiResult<Json<Outcome<Chapter>>> {
    Ok(Json(api.manager.update_chapter(&id, changes).await?))
}

async fn delete_chapter(
    State(api): ApiState,
    Path(id): Path<String>,
) -> ApiResult<Json<Outcome<()>>> {
    Ok(Json(api.manager.delete_chapter(&id).await?))
}

#[derive(Debug, Default, Deserialize)]
struct ActivityQuery {
    limit: Option<usize>,
}

async fn recent_activity(
    State(api): ApiState,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<EditLogEntry>>> {
    Ok(Json(api.manager.recent_edits(query.limit).await?))
}

#[derive(Debug, Default, Deserialize)]
struct ArticleQuery {
    #[serde(default)]
    published: bool,
}

async fn list_articles(
    State(api): ApiState,
    Query(query): Query<ArticleQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = if query.published {
        api.articles.list_published().await?
    } else {
        api.articles.list_articles().await?
    };
    Ok(Json(articles))
}

async fn create_article(
    State(api): ApiState,
    Json(input): Json<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let article = api.articles.create_article(input).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_article(State(api): ApiState, Path(id): Path<String>) -> ApiResult<Json<Article>> {
    Ok(Json(api.articles.get_article(&id).await?))
}

async fn update_article(
    State(api): ApiState,
    Path(id): Path<String>,
    Json(changes): Json<ArticleChanges>,
) -> ApiResult<Json<Article>> {
    Ok(Json(api.articles.update_article(&id, changes).await?))
}

async fn delete_article(State(api): ApiState, Path(id): Path<String>) -> ApiResult<StatusCode> {
    api.articles.delete_article(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
