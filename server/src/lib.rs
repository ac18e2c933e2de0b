use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ludex_core::persist::{load, IndexPaths};
use ludex_core::{Combinator, ScoreMode, SearchError, SearchIndex};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// One sealed index plus the corpus snapshot it was built from. Queries take
/// an `Arc` clone and keep it for their whole lifetime; reload publishes a
/// fresh snapshot without touching in-flight readers.
pub struct Snapshot {
    pub index: SearchIndex,
    pub corpus: Vec<serde_json::Value>,
}

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    index_root: PathBuf,
    corpus_path: Option<PathBuf>,
    admin_token: Option<String>,
}

impl AppState {
    fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }
}

fn load_snapshot(index_root: &PathBuf, corpus_path: Option<&PathBuf>) -> Result<Snapshot> {
    let index = load(&IndexPaths::new(index_root))?
        .with_context(|| format!("no index artifact under {}; run ludex-indexer build first", index_root.display()))?;
    let corpus = match corpus_path {
        Some(p) => ludex_core::read_corpus_file(p)?,
        None => Vec::new(),
    };
    Ok(Snapshot { index, corpus })
}

pub fn build_app(index_dir: String, corpus_path: Option<String>) -> Result<Router> {
    let index_root = PathBuf::from(&index_dir);
    let corpus_path = corpus_path.map(PathBuf::from);
    let snapshot = load_snapshot(&index_root, corpus_path.as_ref())?;
    tracing::info!(
        num_docs = snapshot.index.num_docs(),
        num_terms = snapshot.index.num_terms(),
        cosine_available = snapshot.index.has_magnitudes(),
        "loaded index snapshot"
    );
    let state = AppState {
        snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
        index_root,
        corpus_path,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/reload", post(reload_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// "weighted" or "cosine"; omitted = report both
    pub mode: Option<String>,
    /// "and" or "or"; omitted = report both
    pub combinator: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Keyed by "<mode>_<combinator>", one entry per requested combination.
    pub modes: BTreeMap<String, ModeResult>,
}

#[derive(Serialize)]
pub struct ModeResult {
    /// False when this index cannot serve the mode (magnitudes missing).
    pub available: bool,
    pub hits: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
    pub full_name: Option<String>,
    pub date_published: Option<String>,
    pub url: Option<String>,
}

fn parse_mode(s: &str) -> Option<ScoreMode> {
    match s {
        "weighted" | "weighted_sum" => Some(ScoreMode::WeightedSum),
        "cosine" => Some(ScoreMode::Cosine),
        _ => None,
    }
}

fn parse_combinator(s: &str) -> Option<Combinator> {
    match s {
        "and" => Some(Combinator::And),
        "or" => Some(Combinator::Or),
        _ => None,
    }
}

fn mode_key(mode: ScoreMode, combinator: Combinator) -> String {
    let m = match mode {
        ScoreMode::WeightedSum => "weighted",
        ScoreMode::Cosine => "cosine",
    };
    let c = match combinator {
        Combinator::And => "and",
        Combinator::Or => "or",
    };
    format!("{m}_{c}")
}

fn display_field(record: Option<&serde_json::Value>, field: &str) -> Option<String> {
    record?.get(field)?.as_str().map(|s| s.to_string())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();

    let modes: Vec<ScoreMode> = match params.mode.as_deref() {
        Some(s) => vec![parse_mode(s).ok_or((StatusCode::BAD_REQUEST, format!("unknown mode {s:?}")))?],
        None => vec![ScoreMode::WeightedSum, ScoreMode::Cosine],
    };
    let combinators: Vec<Combinator> = match params.combinator.as_deref() {
        Some(s) => vec![parse_combinator(s)
            .ok_or((StatusCode::BAD_REQUEST, format!("unknown combinator {s:?}")))?],
        None => vec![Combinator::And, Combinator::Or],
    };

    let snapshot = state.snapshot();
    let mut results = BTreeMap::new();
    for &mode in &modes {
        for &combinator in &combinators {
            let result = match snapshot.index.search(&params.q, mode, combinator) {
                Ok(hits) => ModeResult {
                    available: true,
                    hits: hits
                        .into_iter()
                        .map(|h| {
                            let record = snapshot.corpus.get(h.doc_id as usize);
                            SearchHit {
                                doc_id: h.doc_id,
                                score: h.score,
                                full_name: display_field(record, "full_name"),
                                date_published: display_field(record, "datePublished"),
                                url: display_field(record, "url"),
                            }
                        })
                        .collect(),
                },
                Err(SearchError::MagnitudesUnavailable) => ModeResult {
                    available: false,
                    hits: Vec::new(),
                },
            };
            results.insert(mode_key(mode, combinator), result);
        }
    }

    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        modes: results,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let snapshot = state.snapshot();
    match snapshot.corpus.get(doc_id as usize) {
        Some(record) => Ok(Json(record.clone())),
        None => Err((StatusCode::NOT_FOUND, format!("no document {doc_id}"))),
    }
}

/// Re-read the artifacts and corpus from disk and atomically publish the new
/// snapshot. In-flight queries keep the snapshot they started with.
pub async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let snapshot = load_snapshot(&state.index_root, state.corpus_path.as_ref())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    let num_docs = snapshot.index.num_docs();
    let num_terms = snapshot.index.num_terms();
    *state.snapshot.write() = Arc::new(snapshot);
    tracing::info!(num_docs, num_terms, "index snapshot reloaded");
    Ok(Json(serde_json::json!({
        "status": "reloaded",
        "num_docs": num_docs,
        "num_terms": num_terms,
    })))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let Some(required) = &state.admin_token else {
        // No token configured: reload is open (local deployments).
        return Ok(());
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
