//! HTTP API for uploads, queries, and asset management.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/images` | Multipart upload (`files` parts + optional `tags` field) |
//! | `POST` | `/query` | Natural-language similarity query |
//! | `POST` | `/delete` | Delete an asset by stored path |
//! | `POST` | `/tags` | Replace an asset's tags |
//! | `GET`  | `/assets/{filename}` | Serve stored image bytes |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses use the body:
//!
//! ```json
//! { "error": { "code": "store_unavailable", "message": "..." } }
//! ```
//!
//! Codes: `bad_request` (400), `not_found` (404), `embedding_unavailable`
//! (502), `store_unavailable` (503), `storage_error` / `invalid_dimension`
//! (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support the browser
//! frontend.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::{Embedder, HttpEmbedder};
use crate::error::AssetError;
use crate::ingest;
use crate::models::{IngestReport, SearchHit, Upload};
use crate::search;
use crate::storage::AssetStorage;
use crate::store::{AssetStore, SqliteStore};

/// Shared application state, passed to handlers via Axum's `State`.
///
/// The store, embedder, and storage are injected as trait objects / handles
/// behind `Arc` — there is no module-level singleton.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn AssetStore>,
    pub embedder: Arc<dyn Embedder>,
    pub storage: Arc<AssetStorage>,
}

/// Starts the HTTP server with a SQLite index and the configured embedding
/// endpoint. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.db.path, config.embedding.dims).await?;
    store.ensure_collection().await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
        embedder: Arc::new(HttpEmbedder::new(&config.embedding)?),
        storage: Arc::new(AssetStorage::new(&config.assets.dir)?),
    };

    let bind_addr = state.config.server.bind.clone();
    let app = router(state);

    println!("latent-assets listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router around an injected state (also used by
/// tests to exercise handlers against in-memory doubles).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/images", post(handle_add_images))
        .route("/query", post(handle_query))
        .route("/delete", post(handle_delete))
        .route("/tags", post(handle_update_tags))
        .route("/assets/{filename}", get(handle_serve_asset))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        let (status, code) = match &err {
            AssetError::EmbeddingUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "embedding_unavailable")
            }
            AssetError::StoreUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            AssetError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            AssetError::InvalidDimension { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_dimension")
            }
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /images ============

async fn handle_add_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, AppError> {
    let mut uploads: Vec<Upload> = Vec::new();
    let mut tags = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("files") => {
                let filename = field
                    .file_name()
                    .map(|n| n.to_string())
                    .ok_or_else(|| bad_request("file part is missing a filename"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(e.to_string()))?;
                uploads.push(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("tags") => {
                tags = field.text().await.map_err(|e| bad_request(e.to_string()))?;
            }
            _ => {}
        }
    }

    if uploads.is_empty() {
        return Err(bad_request("no files in upload"));
    }

    let report = ingest::ingest_batch(
        state.store.as_ref(),
        state.embedder.as_ref(),
        &state.storage,
        &uploads,
        &tags,
    )
    .await?;

    Ok(Json(report))
}

// ============ POST /query ============

#[derive(Deserialize)]
struct QueryRequest {
    text: String,
    top_k: Option<i64>,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    results: Vec<SearchHit>,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(bad_request("query text must not be empty"));
    }

    let top_k = request
        .top_k
        .unwrap_or(state.config.retrieval.default_top_k);
    let query_vector = state.embedder.embed_text(&request.text).await?;
    let results = search::search(
        state.store.as_ref(),
        &query_vector,
        top_k,
        request.tag.as_deref().unwrap_or(""),
    )
    .await?;

    Ok(Json(QueryResponse { results }))
}

// ============ POST /delete ============

#[derive(Deserialize)]
struct DeleteRequest {
    path: String,
}

async fn handle_delete(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Idempotent on both sides: a path with no records and a file already
    // gone are each a no-op success.
    state.store.delete_by_path(&request.path).await?;
    state.storage.delete(&request.path)?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ============ POST /tags ============

#[derive(Deserialize)]
struct UpdateTagsRequest {
    path: String,
    tags: Vec<String>,
}

async fn handle_update_tags(
    State(state): State<AppState>,
    Json(request): Json<UpdateTagsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = state
        .store
        .update_tags(&request.path, &request.tags)
        .await?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

// ============ GET /assets/{filename} ============

async fn handle_serve_asset(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let bytes = match state.storage.read(&filename) {
        Ok(bytes) => bytes,
        Err(AssetError::Storage { ref source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            return Err(not_found(format!("no asset named {}", filename)));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], bytes).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
