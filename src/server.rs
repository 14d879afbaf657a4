//! JSON HTTP surface over the article cache.
//!
//! # Routes
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/api/articles` | cache snapshot: page, refresh time, articles |
//! | GET | `/api/status` | readiness flag and current page |
//! | GET | `/load-more` | next listing page's new articles |
//! | GET | `/load-more?offset=N` | cached articles from index N (no scraping) |
//!
//! While the cache is being rebuilt every route except `/api/status` answers
//! `503 Service Unavailable`; a listing failure during a page advance answers
//! `502 Bad Gateway`.

use crate::cache::{ArticleCache, Snapshot};
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::Article;
use crate::pagination::PaginationService;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct AppState<F> {
    pub cache: Arc<ArticleCache>,
    pub pagination: Arc<PaginationService<F>>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            pagination: Arc::clone(&self.pagination),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoadMoreQuery {
    #[serde(default)]
    pub offset: usize,
}

/// A [`ScrapeError`] surfaced to an HTTP client.
#[derive(Debug)]
pub struct ApiError(ScrapeError);

impl From<ScrapeError> for ApiError {
    fn from(e: ScrapeError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ScrapeError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ScrapeError::Listing { .. } | ScrapeError::Http(_) | ScrapeError::Status { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self.0, %status, "Request failed");
        }

        (status, Json(json!({"message": self.0.to_string()}))).into_response()
    }
}

pub fn router<F: PageFetcher + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/api/articles", get(articles::<F>))
        .route("/api/status", get(status::<F>))
        .route("/load-more", get(load_more::<F>))
        .with_state(state)
}

/// Serve the router until the process exits.
pub async fn serve<F: PageFetcher + 'static>(
    listener: TcpListener,
    state: AppState<F>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(state)).await
}

async fn articles<F: PageFetcher + 'static>(
    State(state): State<AppState<F>>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.cache.snapshot().await?))
}

async fn status<F: PageFetcher + 'static>(State(state): State<AppState<F>>) -> Json<Value> {
    Json(json!({
        "ready": state.cache.is_ready().await,
        "page": state.cache.current_page().await,
    }))
}

async fn load_more<F: PageFetcher + 'static>(
    State(state): State<AppState<F>>,
    Query(query): Query<LoadMoreQuery>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = if query.offset > 0 {
        state.pagination.articles_since(query.offset).await?
    } else {
        state.pagination.load_more().await?
    };
    Ok(Json(articles))
}
