//! Per-request pipeline context
//!
//! Each stage reads what earlier stages produced and writes its own output
//! here. Nothing outside one request ever sees this struct.

use crate::classifier::Classification;
use crate::models::{DriftResult, RouteMessageRequest};
use braid_core::RoutingPolicy;
use braid_store::{BranchSummary, Role};

/// Everything one routing request accumulates on its way through the stages
pub struct RouteContext {
    /// The raw request body
    pub request: RouteMessageRequest,
    /// Parsed by the validate stage; defaults to user until then
    pub role: Role,
    /// Server policy with the request's overrides already merged
    pub policy: RoutingPolicy,
    /// Breadcrumbs appended at every stage, returned to the client
    pub reason_codes: Vec<String>,
    /// Candidate branches, `is_current` marked
    pub branches: Vec<BranchSummary>,
    /// The resolved current branch, when the conversation has one
    pub current: Option<BranchSummary>,
    /// Latest message of the current branch, for contextual drift analysis
    pub last_message_content: Option<String>,
    /// The message embedding
    pub embedding: Vec<f32>,
    /// The classifier's decision
    pub classification: Option<Classification>,
    /// The committed result, set by the execute stage
    pub outcome: Option<DriftResult>,
}

impl RouteContext {
    /// Build a context for one request. `policy` must already carry the
    /// request's overrides.
    pub fn new(request: RouteMessageRequest, policy: RoutingPolicy) -> Self {
        Self {
            request,
            role: Role::User,
            policy,
            reason_codes: Vec::new(),
            branches: Vec::new(),
            current: None,
            last_message_content: None,
            embedding: Vec::new(),
            classification: None,
            outcome: None,
        }
    }
}
