//! The routing pipeline
//!
//! TigerStyle: Stages are uniform values run by a simple fold; the fold
//! carries the deadline and the reason-code trail.
//!
//! One request flows through five ordered stages (validate, load_branches,
//! embed, classify, execute) sharing a [`RouteContext`]. Every stage here
//! is critical: its failure aborts the request. The whole fold runs under
//! the policy's pipeline deadline; on expiry the request fails with
//! `Timeout` and already-committed rows simply remain.

pub mod context;
pub mod stages;

pub use context::RouteContext;

use crate::models::DriftResult;
use crate::state::AppState;
use async_trait::async_trait;
use braid_core::{Error, Result};
use std::time::Duration;

/// One pipeline stage
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Critical stages abort the pipeline on error; non-critical failures
    /// are logged and skipped.
    fn critical(&self) -> bool {
        true
    }

    async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()>;
}

/// Ordered stage sequence with a deadline
pub struct Pipeline {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    /// The standard five-stage drift pipeline.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Box::new(stages::Validate),
                Box::new(stages::LoadBranches),
                Box::new(stages::Embed),
                Box::new(stages::Classify),
                Box::new(stages::Execute),
            ],
        }
    }

    /// Run all stages in order under the policy deadline.
    pub async fn run(&self, state: &AppState, ctx: &mut RouteContext) -> Result<DriftResult> {
        let timeout_ms = ctx.policy.pipeline_timeout_ms;
        let deadline = Duration::from_millis(timeout_ms);

        match tokio::time::timeout(deadline, self.run_stages(state, ctx)).await {
            Ok(Ok(())) => ctx
                .outcome
                .take()
                .ok_or_else(|| Error::internal("pipeline finished without an outcome")),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(Error::timeout("drift_pipeline", timeout_ms)),
        }
    }

    async fn run_stages(&self, state: &AppState, ctx: &mut RouteContext) -> Result<()> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), "running pipeline stage");
            if let Err(err) = stage.run(state, ctx).await {
                if stage.critical() {
                    tracing::debug!(stage = stage.name(), error = %err, "critical stage failed");
                    return Err(err);
                }
                tracing::warn!(stage = stage.name(), error = %err, "non-critical stage failed");
            }
        }
        Ok(())
    }
}
