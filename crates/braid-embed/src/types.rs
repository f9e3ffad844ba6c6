//! Wire types for the embedding sidecar
//!
//! Field names follow the sidecar's JSON schema (snake_case pydantic
//! models), not the router's public API casing.

use serde::{Deserialize, Serialize};

/// Request body for `/embed`
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    pub text: String,
    pub preprocess: bool,
}

/// Response body for `/embed`
///
/// The sidecar always answers in batch form; single-text requests come back
/// as a one-element batch.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    pub model: String,
}

/// Request body for `/similarity`
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityRequest {
    pub text1: String,
    pub text2: String,
    pub preprocess: bool,
}

/// Response body for `/similarity`
#[derive(Debug, Clone, Deserialize)]
pub struct SimilarityResponse {
    pub similarity: f32,
    #[serde(default)]
    pub adjusted_similarity: Option<f32>,
}

/// Request body for `/analyze-drift`
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeDriftRequest {
    pub current: String,
    pub previous: String,
    pub current_embedding: Vec<f32>,
    pub branch_centroid: Vec<f32>,
    pub preprocess: bool,
}

/// Linguistic signals the sidecar extracts from the current/previous pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSignals {
    #[serde(default)]
    pub current_is_question: bool,
    #[serde(default)]
    pub previous_is_question: bool,
    #[serde(default)]
    pub current_has_anaphoric_ref: bool,
    #[serde(default)]
    pub has_topic_return_signal: bool,
    #[serde(default)]
    pub entity_overlap: EntityOverlap,
}

/// Weighted entity overlap between the current and previous message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityOverlap {
    #[serde(default)]
    pub has_overlap: bool,
    #[serde(default)]
    pub overlap_score: f32,
    #[serde(default)]
    pub shared_entities: Vec<String>,
}

/// Response body for `/analyze-drift`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftAnalysis {
    pub raw_similarity: f32,
    pub boosted_similarity: f32,
    #[serde(default = "unit_multiplier")]
    pub boost_multiplier: f32,
    #[serde(default)]
    pub boosts_applied: Vec<String>,
    #[serde(default)]
    pub analysis: MessageSignals,
}

fn unit_multiplier() -> f32 {
    1.0
}

impl DriftAnalysis {
    /// The fallback analysis when the sidecar's analysis endpoint failed:
    /// raw cosine only, no boosts, empty signals.
    pub fn raw_only(similarity: f32) -> Self {
        Self {
            raw_similarity: similarity,
            boosted_similarity: similarity,
            boost_multiplier: 1.0,
            boosts_applied: Vec::new(),
            analysis: MessageSignals::default(),
        }
    }
}

/// Response body for `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingHealth {
    pub status: String,
    pub model: String,
    pub device: String,
    pub dimension: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drift_analysis_tolerates_sparse_body() {
        // older sidecars omit boost bookkeeping entirely
        let json = r#"{"raw_similarity": 0.31, "boosted_similarity": 0.40}"#;
        let analysis: DriftAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.boost_multiplier, 1.0);
        assert!(analysis.boosts_applied.is_empty());
        assert!(!analysis.analysis.has_topic_return_signal);
    }

    #[test]
    fn test_raw_only_fallback_has_no_boosts() {
        let analysis = DriftAnalysis::raw_only(0.25);
        assert_eq!(analysis.raw_similarity, 0.25);
        assert_eq!(analysis.boosted_similarity, 0.25);
        assert!(analysis.boosts_applied.is_empty());
        assert_eq!(analysis.analysis, MessageSignals::default());
    }

    #[test]
    fn test_entity_overlap_roundtrip() {
        let signals = MessageSignals {
            current_is_question: true,
            entity_overlap: EntityOverlap {
                has_overlap: true,
                overlap_score: 0.6,
                shared_entities: vec!["paris".into()],
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&signals).unwrap();
        let back: MessageSignals = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signals);
    }
}
