//! The embedding service trait and its reqwest implementation
//!
//! TigerStyle: Never use reqwest directly in routing logic; everything
//! goes through [`EmbeddingService`] so tests swap in the mock.

use crate::error::{EmbedError, EmbedResult};
use crate::types::{
    AnalyzeDriftRequest, DriftAnalysis, EmbedRequest, EmbedResponse, EmbeddingHealth,
    SimilarityRequest, SimilarityResponse,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait over the embedding sidecar
///
/// `embed` failures are fatal to a routing request; `analyze_drift` failures
/// are not (the classifier falls back to raw cosine). That policy lives in
/// the caller; the client just reports what happened.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed one text into a vector.
    async fn embed(&self, text: &str, preprocess: bool) -> EmbedResult<Vec<f32>>;

    /// Cosine similarity of two texts, computed sidecar-side.
    async fn similarity(&self, text1: &str, text2: &str, preprocess: bool) -> EmbedResult<f32>;

    /// Contextual drift analysis of `current` against the previous message
    /// and the branch centroid.
    async fn analyze_drift(
        &self,
        current: &str,
        previous: &str,
        current_embedding: &[f32],
        branch_centroid: &[f32],
        preprocess: bool,
    ) -> EmbedResult<DriftAnalysis>;

    /// Sidecar health probe.
    async fn health(&self) -> EmbedResult<EmbeddingHealth>;
}

/// Production implementation over a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpEmbeddingService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEmbeddingService {
    /// Create a client against `base_url` (no trailing slash needed).
    ///
    /// The underlying reqwest client keeps connections alive across
    /// requests; one instance is shared by all routing tasks.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> EmbedResult<Resp> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| EmbedError::unavailable(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::debug!(endpoint, status = status.as_u16(), "embedding sidecar error status");
            return Err(EmbedError::unavailable(
                endpoint,
                format!("status {status}: {detail}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| EmbedError::malformed(endpoint, e.to_string()))
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str, preprocess: bool) -> EmbedResult<Vec<f32>> {
        let request = EmbedRequest {
            text: text.to_string(),
            preprocess,
        };
        let response: EmbedResponse = self.post_json("/embed", &request).await?;
        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(EmbedError::EmptyResponse {
                endpoint: "/embed".into(),
            })
    }

    async fn similarity(&self, text1: &str, text2: &str, preprocess: bool) -> EmbedResult<f32> {
        let request = SimilarityRequest {
            text1: text1.to_string(),
            text2: text2.to_string(),
            preprocess,
        };
        let response: SimilarityResponse = self.post_json("/similarity", &request).await?;
        Ok(response.similarity)
    }

    async fn analyze_drift(
        &self,
        current: &str,
        previous: &str,
        current_embedding: &[f32],
        branch_centroid: &[f32],
        preprocess: bool,
    ) -> EmbedResult<DriftAnalysis> {
        let request = AnalyzeDriftRequest {
            current: current.to_string(),
            previous: previous.to_string(),
            current_embedding: current_embedding.to_vec(),
            branch_centroid: branch_centroid.to_vec(),
            preprocess,
        };
        self.post_json("/analyze-drift", &request).await
    }

    async fn health(&self) -> EmbedResult<EmbeddingHealth> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbedError::unavailable("/health", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::unavailable(
                "/health",
                format!("status {status}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| EmbedError::malformed("/health", e.to_string()))
    }
}
