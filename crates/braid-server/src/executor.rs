//! The executor: materializes a classification
//!
//! TigerStyle: One critical section per request. Resolve the target branch,
//! create it if the decision was BRANCH, commit the message, fold the
//! embedding into the centroid, and only then fire the background fact
//! extraction.

use crate::facts;
use crate::models::{DriftResult, RouteAction};
use crate::pipeline::RouteContext;
use crate::state::AppState;
use braid_core::{Error, Result};
use braid_store::{BranchStore, DriftType, NewBranch, NewMessage};
use serde_json::json;

/// Materialize `ctx.classification` and set `ctx.outcome`.
pub async fn execute(state: &AppState, ctx: &mut RouteContext) -> Result<()> {
    let classification = ctx
        .classification
        .take()
        .ok_or_else(|| Error::internal("execute reached without a classification"))?;
    let store = state.store();
    let conversation_id = ctx.request.conversation_id.clone();

    // Resolve the target branch; BRANCH creates it here.
    let (branch_id, branch_topic) = match classification.action {
        RouteAction::Stay => {
            let current = ctx.current.as_ref().ok_or_else(|| {
                Error::invalid_input("cannot stay: conversation has no current branch")
            })?;
            (current.id.clone(), Some(current.summary.clone()))
        }
        RouteAction::Route => {
            let target = classification
                .target_branch_id
                .clone()
                .ok_or_else(|| Error::invalid_input("cannot route: no target branch"))?;
            let summary = ctx
                .branches
                .iter()
                .find(|b| b.id == target)
                .map(|b| b.summary.clone());
            (target, summary)
        }
        RouteAction::Branch => {
            let summary = classification
                .new_branch_topic
                .clone()
                .unwrap_or_else(|| ctx.request.content.chars().take(100).collect());
            let drift_type = if classification.drift_action.is_new_cluster() {
                DriftType::Semantic
            } else {
                DriftType::Functional
            };
            let branch = store
                .create_branch(NewBranch {
                    conversation_id: conversation_id.clone(),
                    parent_id: ctx.current.as_ref().map(|b| b.id.clone()),
                    summary,
                    centroid: ctx.embedding.clone(),
                    drift_type,
                })
                .await
                .map_err(Error::from)?;
            tracing::info!(
                conversation_id = %conversation_id,
                branch_id = %branch.id,
                drift_type = branch.drift_type.as_str(),
                depth = branch.depth,
                "created branch"
            );
            (branch.id, Some(branch.summary))
        }
    };

    let message = store
        .insert_message(NewMessage {
            conversation_id: conversation_id.clone(),
            branch_id: branch_id.clone(),
            role: ctx.role,
            content: ctx.request.content.clone(),
            embedding: ctx.embedding.clone(),
        })
        .await
        .map_err(Error::from)?;

    // A new branch's centroid is its seed embedding; existing targets fold
    // the message in under the store's row lock.
    if classification.action != RouteAction::Branch {
        store
            .update_centroid(&branch_id, &ctx.embedding, ctx.role)
            .await
            .map_err(Error::from)?;
    }

    let previous_branch_id = match classification.action {
        RouteAction::Stay => None,
        RouteAction::Route | RouteAction::Branch => ctx.current.as_ref().map(|b| b.id.clone()),
    };

    // The departing branch settles; mine it for facts off the request path.
    let extraction_queued = classification.action != RouteAction::Stay
        && ctx.policy.extract_facts
        && previous_branch_id.is_some();
    if extraction_queued {
        let previous = previous_branch_id.clone().unwrap_or_default();
        ctx.reason_codes.push("fact_extraction_queued".to_string());
        facts::spawn_extraction(state.facts().clone(), store.clone(), previous);
    }

    let fact_extraction = if extraction_queued { "queued" } else { "skipped" };
    let metadata = json!({
        "thresholds": {
            "stay": ctx.policy.stay_threshold,
            "route": ctx.policy.route_threshold,
            "newCluster": ctx.policy.new_cluster_threshold,
        },
        "boostsApplied": classification.boosts_applied,
        "factExtraction": fact_extraction,
    });

    ctx.outcome = Some(DriftResult {
        action: classification.action,
        drift_action: classification.drift_action,
        branch_id,
        message_id: message.id,
        conversation_id,
        previous_branch_id,
        is_new_branch: classification.action == RouteAction::Branch,
        is_new_cluster: classification.drift_action.is_new_cluster(),
        branch_topic,
        similarity: classification.similarity,
        confidence: classification.confidence,
        reason: classification.reason,
        reason_codes: ctx.reason_codes.clone(),
        metadata,
    });
    Ok(())
}
