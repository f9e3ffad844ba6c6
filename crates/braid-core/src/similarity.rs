//! Similarity kernel
//!
//! TigerStyle: Pure functions, no I/O, total over their domains.
//!
//! Everything the drift decision ultimately rests on lives here: cosine
//! similarity, the threshold bucketing that turns a score into a
//! [`DriftAction`], and the role-weighted running-average centroid update.

use crate::constants::{ASSISTANT_CENTROID_WEIGHT, USER_CENTROID_WEIGHT};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Qualitative drift classification of a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftAction {
    /// Message belongs to the branch it was scored against
    Stay,
    /// Message drifted, but within the same semantic neighborhood
    BranchSameCluster,
    /// Message opened a fresh semantic domain
    BranchNewCluster,
}

impl DriftAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftAction::Stay => "STAY",
            DriftAction::BranchSameCluster => "BRANCH_SAME_CLUSTER",
            DriftAction::BranchNewCluster => "BRANCH_NEW_CLUSTER",
        }
    }

    pub fn is_new_cluster(&self) -> bool {
        matches!(self, DriftAction::BranchNewCluster)
    }
}

/// Cosine similarity of two vectors, in [-1, 1].
///
/// Returns 0.0 when either operand has zero magnitude (a branch with an
/// uninitialized centroid compares as unrelated, not as an error).
///
/// # Errors
/// [`Error::DimensionMismatch`] when the operands differ in length.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a_sq = 0.0f32;
    let mut norm_b_sq = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a_sq += x * x;
        norm_b_sq += y * y;
    }

    if norm_a_sq <= f32::EPSILON || norm_b_sq <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok((dot / (norm_a_sq * norm_b_sq).sqrt()).clamp(-1.0, 1.0))
}

/// Bucket a similarity score into a drift action.
///
/// Boundaries are strict: equality with a threshold falls into the lower
/// bucket.
pub fn drift_action(similarity: f32, stay_threshold: f32, new_cluster_threshold: f32) -> DriftAction {
    if similarity > stay_threshold {
        DriftAction::Stay
    } else if similarity > new_cluster_threshold {
        DriftAction::BranchSameCluster
    } else {
        DriftAction::BranchNewCluster
    }
}

/// Centroid weight for a message role.
///
/// The caller passes `is_user = true` for user turns. User turns anchor the
/// branch topic, so they pull the centroid three times as hard.
pub fn role_weight(is_user: bool) -> f32 {
    if is_user {
        USER_CENTROID_WEIGHT
    } else {
        ASSISTANT_CENTROID_WEIGHT
    }
}

/// Role-weighted running-average centroid update.
///
/// `message_count` is the branch's message count *including* the message
/// being folded in. An empty `old` centroid is initialized to the new
/// embedding verbatim.
///
/// # Errors
/// [`Error::DimensionMismatch`] when a non-empty `old` differs in length
/// from `new`.
pub fn update_centroid(
    old: &[f32],
    new: &[f32],
    message_count: u64,
    is_user: bool,
) -> Result<Vec<f32>> {
    if old.is_empty() {
        return Ok(new.to_vec());
    }
    if old.len() != new.len() {
        return Err(Error::DimensionMismatch {
            left: old.len(),
            right: new.len(),
        });
    }

    let weight = role_weight(is_user);
    let denominator = message_count as f32 + weight - 1.0;
    Ok(old
        .iter()
        .zip(new.iter())
        .map(|(o, n)| o + weight * (n - o) / denominator)
        .collect())
}
