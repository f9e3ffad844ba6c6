//! In-memory branch store
//!
//! TigerStyle: One write lock stands in for row-level locking; every
//! compound operation happens under a single guard, so readers never see a
//! torn centroid/count pair.
//!
//! Suitable for tests and single-node deployments. Durable backends
//! implement the same trait against relational tables.

use crate::error::{StoreError, StoreResult};
use crate::store::{BranchStore, NewBranch, NewMessage};
use crate::types::{Branch, BranchSummary, Conversation, FactRecord, MessageRecord, Role};
use async_trait::async_trait;
use braid_core::update_centroid;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryStoreInner {
    conversations: HashMap<String, Conversation>,
    branches: HashMap<String, Branch>,
    /// branch_id -> messages in arrival order
    messages: HashMap<String, Vec<MessageRecord>>,
    /// branch_id -> facts
    facts: HashMap<String, Vec<FactRecord>>,
}

/// In-memory [`BranchStore`] implementation
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_messages(messages: &[MessageRecord]) -> Vec<MessageRecord> {
    let mut sorted = messages.to_vec();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    sorted
}

#[async_trait]
impl BranchStore for MemoryStore {
    async fn upsert_conversation(&self, id: &str) -> StoreResult<Conversation> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let conversation = inner
            .conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation {
                id: id.to_string(),
                created_at: now,
                updated_at: now,
            });
        Ok(conversation.clone())
    }

    async fn list_branches(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<BranchSummary>> {
        let inner = self.inner.read().await;
        let mut branches: Vec<&Branch> = inner
            .branches
            .values()
            .filter(|b| b.conversation_id == conversation_id)
            .collect();
        branches.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(branches
            .into_iter()
            .take(limit)
            .map(|b| BranchSummary {
                id: b.id.clone(),
                summary: b.summary.clone(),
                message_count: inner
                    .messages
                    .get(&b.id)
                    .map(|m| m.len() as u64)
                    .unwrap_or(0),
                centroid: b.centroid.clone(),
                parent_id: b.parent_branch_id.clone(),
                drift_type: b.drift_type,
                is_current: false,
                updated_at: b.updated_at,
            })
            .collect())
    }

    async fn last_message_content(&self, branch_id: &str) -> StoreResult<Option<String>> {
        let inner = self.inner.read().await;
        let Some(messages) = inner.messages.get(branch_id) else {
            return Ok(None);
        };
        Ok(sorted_messages(messages)
            .last()
            .map(|m| m.content.clone()))
    }

    async fn create_branch(&self, branch: NewBranch) -> StoreResult<Branch> {
        let mut inner = self.inner.write().await;

        if !inner.conversations.contains_key(&branch.conversation_id) {
            return Err(StoreError::not_found("conversation", &branch.conversation_id));
        }

        let depth = match &branch.parent_id {
            None => 0,
            Some(parent_id) => {
                let parent = inner
                    .branches
                    .get(parent_id)
                    .ok_or_else(|| StoreError::not_found("branch", parent_id))?;
                if parent.conversation_id != branch.conversation_id {
                    return Err(StoreError::ConversationMismatch {
                        branch_id: parent_id.clone(),
                        expected: parent.conversation_id.clone(),
                        actual: branch.conversation_id.clone(),
                    });
                }
                parent.depth + 1
            }
        };

        let now = Utc::now();
        let record = Branch {
            id: Uuid::new_v4().to_string(),
            conversation_id: branch.conversation_id,
            parent_branch_id: branch.parent_id,
            summary: branch.summary,
            centroid: branch.centroid,
            drift_type: branch.drift_type,
            depth,
            created_at: now,
            updated_at: now,
        };
        inner.branches.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn insert_message(&self, message: NewMessage) -> StoreResult<MessageRecord> {
        let mut inner = self.inner.write().await;

        let branch = inner
            .branches
            .get(&message.branch_id)
            .ok_or_else(|| StoreError::not_found("branch", &message.branch_id))?;
        if branch.conversation_id != message.conversation_id {
            return Err(StoreError::ConversationMismatch {
                branch_id: message.branch_id.clone(),
                expected: branch.conversation_id.clone(),
                actual: message.conversation_id.clone(),
            });
        }

        let now = Utc::now();
        let record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: message.conversation_id.clone(),
            branch_id: message.branch_id.clone(),
            role: message.role,
            content: message.content,
            embedding: message.embedding,
            created_at: now,
        };
        inner
            .messages
            .entry(message.branch_id.clone())
            .or_default()
            .push(record.clone());

        // message arrival counts as branch activity
        if let Some(branch) = inner.branches.get_mut(&message.branch_id) {
            branch.updated_at = now;
        }
        if let Some(conversation) = inner.conversations.get_mut(&message.conversation_id) {
            conversation.updated_at = now;
        }

        Ok(record)
    }

    async fn update_centroid(
        &self,
        branch_id: &str,
        embedding: &[f32],
        role: Role,
    ) -> StoreResult<Vec<f32>> {
        // single guard: the count read and centroid write cannot interleave
        // with another writer
        let mut inner = self.inner.write().await;

        let message_count = inner
            .messages
            .get(branch_id)
            .map(|m| m.len() as u64)
            .unwrap_or(0);

        let branch = inner
            .branches
            .get_mut(branch_id)
            .ok_or_else(|| StoreError::not_found("branch", branch_id))?;

        let centroid = update_centroid(&branch.centroid, embedding, message_count, role.is_user())?;
        branch.centroid = centroid.clone();
        branch.updated_at = Utc::now();
        Ok(centroid)
    }

    async fn branch(&self, branch_id: &str) -> StoreResult<Branch> {
        let inner = self.inner.read().await;
        inner
            .branches
            .get(branch_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("branch", branch_id))
    }

    async fn message_count(&self, branch_id: &str) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .get(branch_id)
            .map(|m| m.len() as u64)
            .unwrap_or(0))
    }

    async fn recent_messages(
        &self,
        branch_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<MessageRecord>> {
        let inner = self.inner.read().await;
        let Some(messages) = inner.messages.get(branch_id) else {
            return Ok(Vec::new());
        };
        let sorted = sorted_messages(messages);
        let skip = sorted.len().saturating_sub(limit);
        Ok(sorted.into_iter().skip(skip).collect())
    }

    async fn upsert_fact(&self, fact: FactRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.branches.contains_key(&fact.branch_id) {
            return Err(StoreError::not_found("branch", &fact.branch_id));
        }
        let facts = inner.facts.entry(fact.branch_id.clone()).or_default();
        match facts.iter_mut().find(|f| f.key == fact.key) {
            Some(existing) => *existing = fact,
            None => facts.push(fact),
        }
        Ok(())
    }

    async fn list_facts(&self, branch_id: &str) -> StoreResult<Vec<FactRecord>> {
        let inner = self.inner.read().await;
        let mut facts = inner.facts.get(branch_id).cloned().unwrap_or_default();
        facts.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(facts)
    }
}
