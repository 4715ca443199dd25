use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wikiconflict_core::global_words::load_global_words;
use wikiconflict_core::topics::top_global_words;
use wikiconflict_core::{export, GlobalWordCounts, PageStore, PageWordCounts, RunMeta, TopicGroup, WorkDir};

const MAX_TOP_WORDS: usize = 1000;

#[derive(Deserialize)]
pub struct TopParams {
    #[serde(default = "default_n")]
    pub n: usize,
}
fn default_n() -> usize { 10 }

#[derive(Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub meta: Arc<RunMeta>,
    pub pages: Arc<PageStore>,
    pub global_words: Arc<GlobalWordCounts>,
    pub topics: Arc<Vec<TopicGroup>>,
}

/// Loads the artifacts of a finished run from `work_dir` and builds the router.
pub fn build_app(work_dir: String) -> Result<Router> {
    let work = WorkDir::new(&work_dir);
    let meta = export::run_meta(&work)
        .with_context(|| format!("{work_dir} does not hold a finished analyzer run"))?;
    let pages = PageStore::open(&work)?;
    let global_words = load_global_words(&work)?;
    let topics = export::topics(&work, meta.top_n_topic_words)?.collect::<wikiconflict_core::Result<Vec<_>>>()?;
    tracing::info!(
        language = %meta.language,
        created_at = %meta.created_at,
        pages = pages.len(),
        vocabulary = global_words.len(),
        topics = topics.len(),
        "artifacts loaded"
    );

    let app_state = AppState { meta: Arc::new(meta), pages: Arc::new(pages), global_words: Arc::new(global_words), topics: Arc::new(topics) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/meta", get(meta_handler))
        .route("/words/top", get(top_words_handler))
        .route("/topics", get(topics_handler))
        .route("/pages/:page_id", get(page_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn meta_handler(State(state): State<AppState>) -> Json<RunMeta> {
    Json(state.meta.as_ref().clone())
}

pub async fn top_words_handler(State(state): State<AppState>, Query(params): Query<TopParams>) -> Json<Vec<WordCount>> {
    let n = params.n.clamp(1, MAX_TOP_WORDS);
    let words = top_global_words(&state.global_words, n)
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    Json(words)
}

pub async fn topics_handler(State(state): State<AppState>) -> Json<Vec<TopicGroup>> {
    Json(state.topics.as_ref().clone())
}

pub async fn page_handler(
    State(state): State<AppState>,
    Path(page_id): Path<u32>,
) -> Result<Json<PageWordCounts>, (StatusCode, String)> {
    match state.pages.get(page_id) {
        Ok(Some(page)) => Ok(Json(page)),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("page {page_id} not found"))),
        Err(e) => {
            tracing::error!(page_id, error = %e, "page lookup failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
