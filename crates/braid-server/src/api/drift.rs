//! The routing endpoint
//!
//! `POST /messages` (alias `POST /drift/route`): one message in, one
//! committed routing decision out.

use crate::api::ApiError;
use crate::models::{ApiSuccess, DriftResult, RouteMessageRequest};
use crate::pipeline::{Pipeline, RouteContext};
use crate::state::AppState;
use axum::{extract::State, Json};
use tracing::instrument;

#[instrument(
    skip(state, request),
    fields(conversation_id = %request.conversation_id, role = ?request.role),
    level = "info"
)]
pub async fn route_message(
    State(state): State<AppState>,
    Json(request): Json<RouteMessageRequest>,
) -> Result<Json<ApiSuccess<DriftResult>>, ApiError> {
    let policy = state.policy().with_overrides(&request.overrides());
    let mut ctx = RouteContext::new(request, policy);

    let result = Pipeline::standard().run(&state, &mut ctx).await?;

    tracing::info!(
        action = result.action.as_str(),
        drift_action = result.drift_action.as_str(),
        branch_id = %result.branch_id,
        similarity = result.similarity,
        "routed message"
    );
    Ok(Json(ApiSuccess::new(result)))
}
