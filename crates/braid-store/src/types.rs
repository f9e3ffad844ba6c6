//! Persistent record types
//!
//! Field layout mirrors the relational schema: conversations own branches,
//! branches own messages and facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Whether a branch was born of a new-cluster or same-cluster drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftType {
    /// New semantic domain (BRANCH_NEW_CLUSTER at creation)
    Semantic,
    /// Same neighborhood, different thread (BRANCH_SAME_CLUSTER)
    Functional,
}

impl DriftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftType::Semantic => "semantic",
            DriftType::Functional => "functional",
        }
    }
}

/// Root container for a message stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A node in the per-conversation topic tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub conversation_id: String,
    /// None only for a conversation's first branch
    pub parent_branch_id: Option<String>,
    /// Short topic label, clipped to 100 chars
    pub summary: String,
    /// Running weighted mean of message embeddings; empty until the first
    /// message commits
    pub centroid: Vec<f32>,
    pub drift_type: DriftType,
    /// 0 for a root branch, parent depth + 1 otherwise
    pub depth: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One turn of a conversation, bound to exactly one branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub branch_id: String,
    pub role: Role,
    pub content: String,
    /// May be empty for historical rows predating embedding capture
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// Branch view the classifier scores against
///
/// `is_current` is not a stored column: the pipeline marks it after
/// resolving the request's current branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSummary {
    pub id: String,
    pub summary: String,
    pub message_count: u64,
    pub centroid: Vec<f32>,
    pub parent_id: Option<String>,
    pub drift_type: DriftType,
    pub is_current: bool,
    pub updated_at: DateTime<Utc>,
}

/// A fact extracted from a settled branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactRecord {
    pub branch_id: String,
    /// snake_case key, unique per branch
    pub key: String,
    pub value: String,
    pub confidence: f32,
    pub source_message_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
