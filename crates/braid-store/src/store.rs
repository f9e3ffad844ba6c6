//! The `BranchStore` trait
//!
//! TigerStyle: The persistence seam names exactly the operations routing
//! needs; backends decide how to make them atomic.

use crate::error::StoreResult;
use crate::types::{Branch, BranchSummary, Conversation, FactRecord, MessageRecord, Role};
use async_trait::async_trait;

/// Parameters for branch creation
#[derive(Debug, Clone)]
pub struct NewBranch {
    pub conversation_id: String,
    /// Current branch at classification time; None for the first branch
    pub parent_id: Option<String>,
    pub summary: String,
    /// Seeded with the triggering message's embedding
    pub centroid: Vec<f32>,
    pub drift_type: crate::types::DriftType,
}

/// Parameters for message insertion
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub branch_id: String,
    pub role: Role,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Transactional persistence for conversations, branches, messages, facts
///
/// Contract highlights (backends must uphold all of these):
/// - `upsert_conversation` is idempotent and tolerates concurrent duplicate
///   creates: a unique-key violation on the conversation id is swallowed and
///   treated as success; any other failure propagates.
/// - `update_centroid` reads the branch's message count and writes the new
///   centroid under a lock on the branch row, so the running-average formula
///   stays consistent with the count the writer observed.
/// - `insert_message` refuses a branch id that does not exist or belongs to
///   a different conversation; committed messages are never orphaned.
/// - `list_branches` orders by `updated_at` descending, ties broken by id
///   ascending, so the first row is the implicit current branch.
#[async_trait]
pub trait BranchStore: Send + Sync {
    /// Create the conversation if absent; return it either way.
    async fn upsert_conversation(&self, id: &str) -> StoreResult<Conversation>;

    /// Branch summaries for a conversation, most recently updated first,
    /// capped at `limit`. `is_current` is false on every row; the caller
    /// marks it.
    async fn list_branches(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<BranchSummary>>;

    /// Content of the chronologically latest message in a branch, if any.
    async fn last_message_content(&self, branch_id: &str) -> StoreResult<Option<String>>;

    /// Create a branch. Validates the parent (when given) exists and
    /// belongs to the same conversation; derives `depth` from it.
    async fn create_branch(&self, branch: NewBranch) -> StoreResult<Branch>;

    /// Append a message to a branch.
    async fn insert_message(&self, message: NewMessage) -> StoreResult<MessageRecord>;

    /// Fold `embedding` into the branch centroid with the role-weighted
    /// running average, atomically with the message-count read. Returns the
    /// new centroid.
    async fn update_centroid(
        &self,
        branch_id: &str,
        embedding: &[f32],
        role: Role,
    ) -> StoreResult<Vec<f32>>;

    /// Load one branch.
    async fn branch(&self, branch_id: &str) -> StoreResult<Branch>;

    /// Number of messages committed to a branch.
    async fn message_count(&self, branch_id: &str) -> StoreResult<u64>;

    /// The chronologically latest `limit` messages of a branch, oldest
    /// first.
    async fn recent_messages(
        &self,
        branch_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<MessageRecord>>;

    /// Insert or replace a fact by `(branch_id, key)`.
    async fn upsert_fact(&self, fact: FactRecord) -> StoreResult<()>;

    /// Facts for a branch, ordered by key.
    async fn list_facts(&self, branch_id: &str) -> StoreResult<Vec<FactRecord>>;
}
