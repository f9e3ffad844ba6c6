//! Background fact extraction
//!
//! When a message departs a branch (BRANCH or ROUTE), the branch it left is
//! considered settled enough to mine for durable facts. Extraction runs as
//! a fire-and-forget task outside the routing transaction; failures are
//! logged and never surface to the routing response.

use async_trait::async_trait;
use braid_core::{Result, FACT_EXTRACTION_TIMEOUT_MS};
use braid_store::{BranchStore, FactRecord, Role};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// How many trailing messages of the settled branch are mined.
const FACT_SOURCE_MESSAGES_MAX: usize = 20;

/// Confidence assigned to cue-matched facts.
const FACT_CONFIDENCE_DEFAULT: f32 = 0.6;

/// Fact values are clipped to this many characters.
const FACT_VALUE_CHARS_MAX: usize = 80;

/// snake_case fact key and the lowercase cue that introduces its value.
const FACT_CUES: &[(&str, &str)] = &[
    ("user_name", "my name is "),
    ("home_location", "i live in "),
    ("stated_preference", "i prefer "),
    ("stated_goal", "i want to "),
    ("stated_need", "i need "),
];

/// Derives facts from a settled branch and persists them through the store
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Returns the number of facts written.
    async fn extract(&self, store: &dyn BranchStore, branch_id: &str) -> Result<usize>;
}

/// Cue-based extractor over the branch's recent user turns
///
/// A deliberately small stand-in for model-backed extraction: it recognizes
/// first-person statements ("my name is …", "I prefer …") and stores the
/// trailing clause as the fact value, keyed snake_case per the cue.
#[derive(Debug, Default, Clone)]
pub struct HeuristicFactExtractor;

impl HeuristicFactExtractor {
    pub fn new() -> Self {
        Self
    }

    fn clause_after(text: &str, cue_end: usize) -> Option<String> {
        let rest = &text[cue_end..];
        let end = rest
            .find(['.', '!', '?', ',', '\n'])
            .unwrap_or(rest.len());
        let value: String = rest[..end].trim().chars().take(FACT_VALUE_CHARS_MAX).collect();
        (!value.is_empty()).then_some(value)
    }
}

#[async_trait]
impl FactExtractor for HeuristicFactExtractor {
    async fn extract(&self, store: &dyn BranchStore, branch_id: &str) -> Result<usize> {
        let messages = store
            .recent_messages(branch_id, FACT_SOURCE_MESSAGES_MAX)
            .await
            .map_err(braid_core::Error::from)?;

        // key -> (value, source message ids); later matches win the value,
        // sources accumulate
        let mut found: BTreeMap<&str, (String, Vec<String>)> = BTreeMap::new();
        for message in &messages {
            if message.role != Role::User {
                continue;
            }
            let lower = message.content.to_lowercase();
            for &(key, cue) in FACT_CUES {
                let Some(pos) = lower.find(cue) else {
                    continue;
                };
                let Some(value) = Self::clause_after(&lower, pos + cue.len()) else {
                    continue;
                };
                let entry = found.entry(key).or_insert_with(|| (value.clone(), Vec::new()));
                entry.0 = value;
                entry.1.push(message.id.clone());
            }
        }

        let count = found.len();
        for (key, (value, source_message_ids)) in found {
            store
                .upsert_fact(FactRecord {
                    branch_id: branch_id.to_string(),
                    key: key.to_string(),
                    value,
                    confidence: FACT_CONFIDENCE_DEFAULT,
                    source_message_ids,
                    updated_at: Utc::now(),
                })
                .await
                .map_err(braid_core::Error::from)?;
        }
        Ok(count)
    }
}

/// Fire-and-forget extraction with its own deadline.
///
/// Spawned from the executor after the routing transaction committed; holds
/// no routing locks and reports nothing back.
pub fn spawn_extraction(
    extractor: Arc<dyn FactExtractor>,
    store: Arc<dyn BranchStore>,
    branch_id: String,
) {
    tokio::spawn(async move {
        let deadline = Duration::from_millis(FACT_EXTRACTION_TIMEOUT_MS);
        match tokio::time::timeout(deadline, extractor.extract(store.as_ref(), &branch_id)).await {
            Ok(Ok(count)) => {
                tracing::debug!(branch_id = %branch_id, count, "fact extraction finished");
            }
            Ok(Err(err)) => {
                tracing::warn!(branch_id = %branch_id, error = %err, "fact extraction failed");
            }
            Err(_) => {
                tracing::warn!(
                    branch_id = %branch_id,
                    timeout_ms = FACT_EXTRACTION_TIMEOUT_MS,
                    "fact extraction timed out"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_store::{DriftType, MemoryStore, NewBranch, NewMessage};

    async fn seeded_branch(store: &MemoryStore, contents: &[(&str, Role)]) -> String {
        store.upsert_conversation("c1").await.unwrap();
        let branch = store
            .create_branch(NewBranch {
                conversation_id: "c1".into(),
                parent_id: None,
                summary: "trip planning".into(),
                centroid: vec![1.0, 0.0],
                drift_type: DriftType::Semantic,
            })
            .await
            .unwrap();
        for (content, role) in contents {
            store
                .insert_message(NewMessage {
                    conversation_id: "c1".into(),
                    branch_id: branch.id.clone(),
                    role: *role,
                    content: (*content).to_string(),
                    embedding: vec![1.0, 0.0],
                })
                .await
                .unwrap();
        }
        branch.id
    }

    #[tokio::test]
    async fn test_extracts_cue_facts_from_user_turns() {
        let store = MemoryStore::new();
        let branch_id = seeded_branch(
            &store,
            &[
                ("My name is Ada. I want to visit Paris in June", Role::User),
                ("Paris in June sounds lovely", Role::Assistant),
            ],
        )
        .await;

        let extractor = HeuristicFactExtractor::new();
        let count = extractor.extract(&store, &branch_id).await.unwrap();
        assert_eq!(count, 2);

        let facts = store.list_facts(&branch_id).await.unwrap();
        let name = facts.iter().find(|f| f.key == "user_name").unwrap();
        assert_eq!(name.value, "ada");
        assert_eq!(name.source_message_ids.len(), 1);

        let goal = facts.iter().find(|f| f.key == "stated_goal").unwrap();
        assert_eq!(goal.value, "visit paris in june");
    }

    #[tokio::test]
    async fn test_assistant_turns_are_ignored() {
        let store = MemoryStore::new();
        let branch_id = seeded_branch(
            &store,
            &[("My name is HelperBot, how can I help?", Role::Assistant)],
        )
        .await;

        let extractor = HeuristicFactExtractor::new();
        assert_eq!(extractor.extract(&store, &branch_id).await.unwrap(), 0);
        assert!(store.list_facts(&branch_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_cue_keeps_latest_value_and_all_sources() {
        let store = MemoryStore::new();
        let branch_id = seeded_branch(
            &store,
            &[
                ("I prefer window seats", Role::User),
                ("Actually, I prefer aisle seats", Role::User),
            ],
        )
        .await;

        let extractor = HeuristicFactExtractor::new();
        extractor.extract(&store, &branch_id).await.unwrap();

        let facts = store.list_facts(&branch_id).await.unwrap();
        let pref = facts.iter().find(|f| f.key == "stated_preference").unwrap();
        assert_eq!(pref.value, "aisle seats");
        assert_eq!(pref.source_message_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_no_cues_writes_nothing() {
        let store = MemoryStore::new();
        let branch_id = seeded_branch(&store, &[("what is the weather today", Role::User)]).await;

        let extractor = HeuristicFactExtractor::new();
        assert_eq!(extractor.extract(&store, &branch_id).await.unwrap(), 0);
    }
}
