//! Deterministic mock embedding service
//!
//! Generates token-hash embeddings: each token ≥ 3 chars maps to a fixed
//! pseudo-random unit vector, and a text embeds as the normalized sum of its
//! token vectors. Texts that share words land close together, unrelated
//! texts land near-orthogonal: enough structure to exercise every routing
//! path without a model. Not suitable for real semantic search.

use crate::error::{EmbedError, EmbedResult};
use crate::types::{DriftAnalysis, EmbeddingHealth, EntityOverlap, MessageSignals};
use crate::EmbeddingService;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Question-continuity boost the real sidecar applies when a question
/// follows a statement.
const QUESTION_CONTINUITY_BOOST: f32 = 1.3;

/// Entity-overlap boost when the current message reuses most of the
/// previous message's entities.
const ENTITY_OVERLAP_BOOST: f32 = 1.2;

const ENTITY_OVERLAP_BOOST_FLOOR: f32 = 0.5;

const TOPIC_RETURN_CUES: &[&str] = &[
    "back to",
    "returning to",
    "going back to",
    "speaking of",
    "on another note",
    "changing topic",
    "different subject",
    "regarding",
];

const INTERROGATIVE_STARTS: &[&str] = &[
    "who", "what", "where", "when", "why", "how", "which", "can", "could", "would", "should",
    "do", "does", "did", "is", "are", "will",
];

/// Deterministic embedding service for tests
#[derive(Debug)]
pub struct MockEmbeddingService {
    dimension: usize,
    fail_embed: AtomicBool,
    fail_analysis: AtomicBool,
}

impl MockEmbeddingService {
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self {
            dimension,
            fail_embed: AtomicBool::new(false),
            fail_analysis: AtomicBool::new(false),
        }
    }

    /// 384 dims, matching the default sidecar model.
    pub fn default_384() -> Self {
        Self::new(braid_core::EMBEDDING_DIM_DEFAULT)
    }

    /// Make subsequent `embed` calls fail, simulating a sidecar outage.
    pub fn set_fail_embed(&self, fail: bool) {
        self.fail_embed.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `analyze_drift` calls fail, exercising the raw-cosine
    /// fallback path.
    pub fn set_fail_analysis(&self, fail: bool) {
        self.fail_analysis.store(fail, Ordering::SeqCst);
    }

    fn tokens(text: &str) -> BTreeSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 3)
            .map(str::to_string)
            .collect()
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut seed: u64 = 0;
        for (i, &byte) in token.as_bytes().iter().enumerate() {
            seed = seed.wrapping_add(byte as u64 * (i as u64 + 1));
            seed = seed.wrapping_mul(31);
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (i, value) in vector.iter_mut().enumerate() {
            let hash = seed.wrapping_add(i as u64).wrapping_mul(0x517cc1b727220a95);
            *value = ((hash as i64) as f32) / (i64::MAX as f32);
        }
        normalize(&mut vector);
        vector
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let tokens = Self::tokens(text);
        let mut embedding = vec![0.0f32; self.dimension];

        if tokens.is_empty() {
            // texts with no usable tokens still get a stable unit vector
            return self.token_vector(text.trim());
        }

        for token in &tokens {
            for (acc, value) in embedding.iter_mut().zip(self.token_vector(token)) {
                *acc += value;
            }
        }
        normalize(&mut embedding);
        embedding
    }

    fn is_question(text: &str) -> bool {
        if text.contains('?') {
            return true;
        }
        let first = text
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();
        INTERROGATIVE_STARTS.contains(&first.as_str())
    }

    fn has_topic_return_cue(text: &str) -> bool {
        let lower = text.to_lowercase();
        TOPIC_RETURN_CUES.iter().any(|cue| lower.contains(cue))
    }

    fn has_anaphoric_ref(text: &str) -> bool {
        let first = text
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();
        matches!(
            first.as_str(),
            "this" | "that" | "these" | "those" | "it" | "they"
        )
    }
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    async fn embed(&self, text: &str, _preprocess: bool) -> EmbedResult<Vec<f32>> {
        if self.fail_embed.load(Ordering::SeqCst) {
            return Err(EmbedError::unavailable("/embed", "mock outage"));
        }
        Ok(self.embed_sync(text))
    }

    async fn similarity(&self, text1: &str, text2: &str, _preprocess: bool) -> EmbedResult<f32> {
        let a = self.embed_sync(text1);
        let b = self.embed_sync(text2);
        Ok(braid_core::cosine(&a, &b).unwrap_or(0.0))
    }

    async fn analyze_drift(
        &self,
        current: &str,
        previous: &str,
        current_embedding: &[f32],
        branch_centroid: &[f32],
        _preprocess: bool,
    ) -> EmbedResult<DriftAnalysis> {
        if self.fail_analysis.load(Ordering::SeqCst) {
            return Err(EmbedError::unavailable("/analyze-drift", "mock outage"));
        }

        let raw = braid_core::cosine(current_embedding, branch_centroid).unwrap_or(0.0);

        let current_tokens = Self::tokens(current);
        let previous_tokens = Self::tokens(previous);
        let shared: Vec<String> = current_tokens
            .intersection(&previous_tokens)
            .cloned()
            .collect();
        let overlap_score = if current_tokens.is_empty() {
            0.0
        } else {
            shared.len() as f32 / current_tokens.len() as f32
        };

        let current_is_question = Self::is_question(current);
        let previous_is_question = Self::is_question(previous);

        let mut multiplier = 1.0f32;
        let mut boosts_applied = Vec::new();
        if current_is_question && !previous_is_question {
            multiplier *= QUESTION_CONTINUITY_BOOST;
            boosts_applied.push("question_continuity".to_string());
        }
        if overlap_score >= ENTITY_OVERLAP_BOOST_FLOOR {
            multiplier *= ENTITY_OVERLAP_BOOST;
            boosts_applied.push("entity_overlap".to_string());
        }

        Ok(DriftAnalysis {
            raw_similarity: raw,
            boosted_similarity: (raw * multiplier).clamp(-1.0, 1.0),
            boost_multiplier: multiplier,
            boosts_applied,
            analysis: MessageSignals {
                current_is_question,
                previous_is_question,
                current_has_anaphoric_ref: Self::has_anaphoric_ref(current),
                has_topic_return_signal: Self::has_topic_return_cue(current),
                entity_overlap: EntityOverlap {
                    has_overlap: !shared.is_empty(),
                    overlap_score,
                    shared_entities: shared,
                },
            },
        })
    }

    async fn health(&self) -> EmbedResult<EmbeddingHealth> {
        Ok(EmbeddingHealth {
            status: "healthy".to_string(),
            model: "mock-token-hash".to_string(),
            device: "cpu".to_string(),
            dimension: self.dimension,
        })
    }
}
