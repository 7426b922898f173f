//! Embedding gateway abstraction and HTTP client.
//!
//! The [`Embedder`] trait hides the inference service behind two calls,
//! `embed_text` and `embed_image`, both returning a unit vector of the
//! configured dimension. The model service normalizes its output; nothing in
//! this crate re-normalizes.
//!
//! Also provides the vector utilities shared by the store backends:
//! [`vec_to_blob`] / [`blob_to_vec`] for SQLite BLOB storage and
//! [`cosine_similarity`].
//!
//! # Retry Strategy
//!
//! [`HttpEmbedder`] retries transient failures with exponential backoff:
//! - HTTP 429 and 5xx → retry
//! - other 4xx → fail immediately
//! - network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::{AssetError, AssetResult};

/// Opaque text/image → unit vector function.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedding vector dimensionality.
    fn dims(&self) -> usize;

    /// Embed a natural-language query.
    async fn embed_text(&self, text: &str) -> AssetResult<Vec<f32>>;

    /// Embed raw image bytes. The filename is passed through to the service
    /// for content-type sniffing only.
    async fn embed_image(&self, filename: &str, bytes: &[u8]) -> AssetResult<Vec<f32>>;
}

/// Client for the multimodal inference HTTP service.
///
/// Calls `POST {endpoint}/embed/text` with a JSON body and
/// `POST {endpoint}/embed/image` with a multipart file upload; both respond
/// `{"embedding": [...]}`.
pub struct HttpEmbedder {
    endpoint: String,
    dims: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> AssetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssetError::EmbeddingUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            dims: config.dims,
            max_retries: config.max_retries,
            client,
        })
    }

    async fn request_embedding<F>(&self, build: F) -> AssetResult<Vec<f32>>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value =
                            response.json().await.map_err(|e| {
                                AssetError::EmbeddingUnavailable {
                                    reason: format!("invalid response body: {}", e),
                                }
                            })?;
                        let vector = parse_embedding_response(&json)?;
                        return self.check_dims(vector);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        last_err = Some(format!("HTTP {}: {}", status, body));
                        continue;
                    }

                    // Other client errors — don't retry
                    let body = response.text().await.unwrap_or_default();
                    return Err(AssetError::EmbeddingUnavailable {
                        reason: format!("HTTP {}: {}", status, body),
                    });
                }
                Err(e) => {
                    last_err = Some(e.to_string());
                    continue;
                }
            }
        }

        Err(AssetError::EmbeddingUnavailable {
            reason: last_err.unwrap_or_else(|| "retries exhausted".to_string()),
        })
    }

    fn check_dims(&self, vector: Vec<f32>) -> AssetResult<Vec<f32>> {
        if vector.len() != self.dims {
            return Err(AssetError::InvalidDimension {
                expected: self.dims,
                found: vector.len(),
            });
        }
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_text(&self, text: &str) -> AssetResult<Vec<f32>> {
        let url = format!("{}/embed/text", self.endpoint);
        let body = serde_json::json!({ "text": text });
        self.request_embedding(|client| client.post(&url).json(&body))
            .await
    }

    async fn embed_image(&self, filename: &str, bytes: &[u8]) -> AssetResult<Vec<f32>> {
        let url = format!("{}/embed/image", self.endpoint);
        let filename = filename.to_string();
        let bytes = bytes.to_vec();
        self.request_embedding(move |client| {
            let part = reqwest::multipart::Part::bytes(bytes.clone())
                .file_name(filename.clone())
                .mime_str("image/jpeg")
                .unwrap_or_else(|_| {
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(filename.clone())
                });
            let form = reqwest::multipart::Form::new().part("file", part);
            client.post(&url).multipart(form)
        })
        .await
    }
}

/// Extract the `embedding` array from an inference service response.
fn parse_embedding_response(json: &serde_json::Value) -> AssetResult<Vec<f32>> {
    let values = json
        .get("embedding")
        .and_then(|e| e.as_array())
        .ok_or_else(|| AssetError::EmbeddingUnavailable {
            reason: "invalid response: missing embedding array".to_string(),
        })?;

    Ok(values
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector. Reverses [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
