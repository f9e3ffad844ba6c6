//! Branch-tree inspection endpoints

use crate::api::ApiError;
use crate::models::{ApiSuccess, BranchView, FactView};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use braid_core::Error;
use braid_store::BranchStore;
use tracing::instrument;

/// Cap on rows returned by the inspection listing.
const BRANCH_LISTING_MAX: usize = 100;

/// List a conversation's branches, most recently updated first
#[instrument(skip(state), fields(conversation_id = %conversation_id), level = "debug")]
pub async fn list_branches(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiSuccess<Vec<BranchView>>>, ApiError> {
    let mut branches = state
        .store()
        .list_branches(&conversation_id, BRANCH_LISTING_MAX)
        .await
        .map_err(Error::from)?;

    // the listing is recency-ordered, so the first row is the implicit
    // current branch
    if let Some(first) = branches.first_mut() {
        first.is_current = true;
    }

    let views = branches
        .into_iter()
        .map(|b| BranchView {
            id: b.id,
            summary: b.summary,
            message_count: b.message_count,
            parent_id: b.parent_id,
            drift_type: b.drift_type.as_str().to_string(),
            is_current: b.is_current,
            updated_at: b.updated_at.to_rfc3339(),
        })
        .collect();
    Ok(Json(ApiSuccess::new(views)))
}

/// List the facts extracted for a branch
#[instrument(skip(state), fields(branch_id = %branch_id), level = "debug")]
pub async fn list_facts(
    State(state): State<AppState>,
    Path(branch_id): Path<String>,
) -> Result<Json<ApiSuccess<Vec<FactView>>>, ApiError> {
    // reject unknown branch ids rather than answering an empty list
    state
        .store()
        .branch(&branch_id)
        .await
        .map_err(Error::from)?;

    let facts = state
        .store()
        .list_facts(&branch_id)
        .await
        .map_err(Error::from)?;

    let views = facts
        .into_iter()
        .map(|f| FactView {
            key: f.key,
            value: f.value,
            confidence: f.confidence,
            source_message_ids: f.source_message_ids,
        })
        .collect();
    Ok(Json(ApiSuccess::new(views)))
}
