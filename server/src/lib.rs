use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use indexer::{SiteSearch, SiteStats};
use search_core::WebPage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_fuzzy")]
    pub fuzzy: bool,
}
fn default_k() -> usize { 10 }
fn default_fuzzy() -> bool { true }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub score: f64,
    pub matched_terms: BTreeSet<String>,
    pub corrections: BTreeMap<String, String>,
    pub snippet: String,
    pub match_count: usize,
}

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub term: String,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub term: String,
    pub suggestions: Vec<String>,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub url: String,
}

/// Read-only handle on the built search engine.
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<SiteSearch>,
}

pub fn build_app(site: SiteSearch) -> Router {
    let state = AppState { site: Arc::new(site) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/suggest", get(suggest_handler))
        .route("/stats", get(stats_handler))
        .route("/page", get(page_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let results: Vec<SearchHit> = state
        .site
        .search(&params.q, k, params.fuzzy)
        .into_iter()
        .map(|r| SearchHit {
            url: r.page.url,
            title: r.page.title,
            score: r.score,
            matched_terms: r.matched_terms,
            corrections: r.corrections,
            snippet: r.snippet,
            match_count: r.match_count,
        })
        .collect();
    let took_ms = start.elapsed().as_millis();
    tracing::debug!(query = %params.q, hits = results.len(), took_ms, "search");
    Json(SearchResponse { query: params.q, took_ms, total_hits: results.len(), results })
}

pub async fn suggest_handler(State(state): State<AppState>, Query(params): Query<SuggestParams>) -> Json<SuggestResponse> {
    let suggestions = state.site.suggestions(&params.term);
    Json(SuggestResponse { term: params.term, suggestions })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<SiteStats> {
    Json(state.site.stats())
}

pub async fn page_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<WebPage>, (StatusCode, Json<serde_json::Value>)> {
    state
        .site
        .page(&params.url)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found", "url": params.url }))))
}
