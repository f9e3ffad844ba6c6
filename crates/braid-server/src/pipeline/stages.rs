//! The five drift-pipeline stages
//!
//! validate → load_branches → embed → classify → execute, all critical.

use crate::classifier::{self, ClassifierInput};
use crate::executor;
use crate::pipeline::{PipelineStage, RouteContext};
use crate::state::AppState;
use async_trait::async_trait;
use braid_core::{Error, Result};
use braid_embed::EmbeddingService;
use braid_store::{BranchStore, BranchSummary, StoreError};

/// Validate inputs and upsert the conversation
pub struct Validate;

#[async_trait]
impl PipelineStage for Validate {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()> {
        if ctx.request.conversation_id.trim().is_empty() {
            return Err(Error::invalid_input("conversationId is required"));
        }
        if ctx.request.content.trim().is_empty() {
            return Err(Error::invalid_input("content is required"));
        }
        ctx.role = ctx
            .request
            .parse_role()
            .map_err(Error::invalid_input)?;
        ctx.policy.validate()?;

        // concurrent creates of the same conversation race; the duplicate
        // loser is a success
        match state
            .store()
            .upsert_conversation(&ctx.request.conversation_id)
            .await
        {
            Ok(_) | Err(StoreError::Conflict { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Load candidate branches and resolve the current one
pub struct LoadBranches;

#[async_trait]
impl PipelineStage for LoadBranches {
    fn name(&self) -> &'static str {
        "load_branches"
    }

    async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()> {
        let store = state.store();
        let mut branches = store
            .list_branches(
                &ctx.request.conversation_id,
                ctx.policy.branches_for_context_max,
            )
            .await
            .map_err(Error::from)?;

        match ctx.request.current_branch_id.clone() {
            Some(requested) => {
                if let Some(branch) = branches.iter_mut().find(|b| b.id == requested) {
                    branch.is_current = true;
                } else {
                    // explicitly pinned branch may sit beyond the context cap
                    let branch = store
                        .branch(&requested)
                        .await
                        .map_err(|_| Error::not_found("branch", &requested))?;
                    if branch.conversation_id != ctx.request.conversation_id {
                        return Err(Error::not_found("branch", &requested));
                    }
                    let message_count = store
                        .message_count(&requested)
                        .await
                        .map_err(Error::from)?;
                    branches.push(BranchSummary {
                        id: branch.id,
                        summary: branch.summary,
                        message_count,
                        centroid: branch.centroid,
                        parent_id: branch.parent_branch_id,
                        drift_type: branch.drift_type,
                        is_current: true,
                        updated_at: branch.updated_at,
                    });
                }
            }
            None => {
                // list is ordered by recency; the first row is the implicit
                // current branch
                if let Some(first) = branches.first_mut() {
                    first.is_current = true;
                }
            }
        }

        ctx.current = branches.iter().find(|b| b.is_current).cloned();
        if branches.is_empty() {
            ctx.reason_codes.push("new_conversation".to_string());
        }
        if let Some(current) = &ctx.current {
            ctx.last_message_content = store
                .last_message_content(&current.id)
                .await
                .map_err(Error::from)?;
        }
        ctx.branches = branches;
        Ok(())
    }
}

/// Embed the message content
pub struct Embed;

#[async_trait]
impl PipelineStage for Embed {
    fn name(&self) -> &'static str {
        "embed"
    }

    async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()> {
        ctx.embedding = state
            .embeddings()
            .embed(&ctx.request.content, ctx.policy.preprocess)
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

/// Run the decision ladder
pub struct Classify;

#[async_trait]
impl PipelineStage for Classify {
    fn name(&self) -> &'static str {
        "classify"
    }

    async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()> {
        let classification = classifier::classify(
            state.embeddings().as_ref(),
            ClassifierInput {
                role: ctx.role,
                content: &ctx.request.content,
                embedding: &ctx.embedding,
                branches: &ctx.branches,
                current: ctx.current.as_ref(),
                last_message_content: ctx.last_message_content.as_deref(),
                policy: &ctx.policy,
            },
        )
        .await?;

        ctx.reason_codes
            .extend(classification.reason_codes.iter().cloned());
        ctx.classification = Some(classification);
        Ok(())
    }
}

/// Materialize the decision
pub struct Execute;

#[async_trait]
impl PipelineStage for Execute {
    fn name(&self) -> &'static str {
        "execute"
    }

    async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()> {
        executor::execute(state, ctx).await
    }
}
