//! API models for the routing surface
//!
//! TigerStyle: These models mirror the public wire schema exactly.
//! camelCase on the wire, snake_case in Rust.

use braid_core::{DriftAction, PolicyOverrides};
use braid_store::Role;
use serde::{Deserialize, Serialize};

/// The three routing outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteAction {
    Stay,
    Route,
    Branch,
}

impl RouteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteAction::Stay => "STAY",
            RouteAction::Route => "ROUTE",
            RouteAction::Branch => "BRANCH",
        }
    }
}

/// Body of `POST /messages` (alias `POST /drift/route`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMessageRequest {
    pub conversation_id: String,
    pub content: String,
    /// "user" (default) or "assistant"; validated in the pipeline so bad
    /// values surface through the error envelope, not a serde rejection
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub current_branch_id: Option<String>,
    #[serde(default)]
    pub extract_facts: Option<bool>,
    #[serde(default)]
    pub stay_threshold: Option<f32>,
    #[serde(default)]
    pub new_cluster_threshold: Option<f32>,
    #[serde(default)]
    pub route_threshold: Option<f32>,
}

impl RouteMessageRequest {
    /// Per-request knobs, merged over the server policy by the pipeline.
    pub fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            stay_threshold: self.stay_threshold,
            new_cluster_threshold: self.new_cluster_threshold,
            route_threshold: self.route_threshold,
            extract_facts: self.extract_facts,
        }
    }

    /// Parse the optional role field; `None` defaults to user.
    pub fn parse_role(&self) -> Result<Role, String> {
        match self.role.as_deref() {
            None | Some("user") => Ok(Role::User),
            Some("assistant") => Ok(Role::Assistant),
            Some(other) => Err(format!("role must be \"user\" or \"assistant\", got \"{other}\"")),
        }
    }
}

/// Routing outcome returned to the client with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftResult {
    pub action: RouteAction,
    pub drift_action: DriftAction,
    pub branch_id: String,
    pub message_id: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_branch_id: Option<String>,
    pub is_new_branch: bool,
    pub is_new_cluster: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_topic: Option<String>,
    pub similarity: f32,
    pub confidence: f32,
    pub reason: String,
    pub reason_codes: Vec<String>,
    pub metadata: serde_json::Value,
}

/// `{ success: true, data }` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{ success: false, error: { message } }` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFailure {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                message: message.into(),
            },
        }
    }
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Pass-through probe of the embedding sidecar
    pub embedding: EmbeddingProbe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingProbe {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One branch row in `GET /conversations/{id}/branches`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub id: String,
    pub summary: String,
    pub message_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub drift_type: String,
    pub is_current: bool,
    pub updated_at: String,
}

/// `GET /branches/{id}/facts` row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactView {
    pub key: String,
    pub value: String,
    pub confidence: f32,
    pub source_message_ids: Vec<String>,
}
