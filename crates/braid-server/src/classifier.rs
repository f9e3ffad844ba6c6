//! The drift classifier
//!
//! TigerStyle: One decision ladder, first match wins, every exit labeled
//! with a reason code.
//!
//! Given the message embedding, the candidate branches, and the sidecar's
//! contextual analysis, produce the [`Classification`] the executor
//! materializes. The ladder:
//!
//! A. assistant turns never open topics: STAY
//! B. no branches yet: BRANCH (first branch)
//! C. current branch has no centroid yet: STAY
//! D. score the current branch (boosted when context is available)
//! E. above the stay threshold: STAY
//! F. another branch scores above the route threshold: ROUTE
//! G. otherwise: BRANCH

use crate::models::RouteAction;
use braid_core::{cosine, drift_action, DriftAction, Result, RoutingPolicy, TOPIC_RETURN_BOOST_FACTOR};
use braid_embed::{DriftAnalysis, EmbeddingService};
use braid_store::{BranchSummary, Role};

/// Output of the decision ladder
#[derive(Debug, Clone)]
pub struct Classification {
    pub action: RouteAction,
    pub drift_action: DriftAction,
    /// Set for STAY and ROUTE; BRANCH resolves its target at execution
    pub target_branch_id: Option<String>,
    /// Set for BRANCH
    pub new_branch_topic: Option<String>,
    pub similarity: f32,
    pub confidence: f32,
    pub reason: String,
    pub reason_codes: Vec<String>,
    /// Boosts the sidecar applied to the current-branch score
    pub boosts_applied: Vec<String>,
}

/// Inputs the ladder runs over; everything is already loaded
pub struct ClassifierInput<'a> {
    pub role: Role,
    pub content: &'a str,
    pub embedding: &'a [f32],
    pub branches: &'a [BranchSummary],
    pub current: Option<&'a BranchSummary>,
    pub last_message_content: Option<&'a str>,
    pub policy: &'a RoutingPolicy,
}

/// Run the decision ladder.
pub async fn classify(
    embeddings: &dyn EmbeddingService,
    input: ClassifierInput<'_>,
) -> Result<Classification> {
    // A. Assistant turns elaborate the current topic; they never move it.
    if input.role == Role::Assistant {
        return Ok(Classification {
            action: RouteAction::Stay,
            drift_action: DriftAction::Stay,
            target_branch_id: input.current.map(|b| b.id.clone()),
            new_branch_topic: None,
            similarity: 1.0,
            confidence: 1.0,
            reason: "assistant_auto_stay".to_string(),
            reason_codes: vec!["assistant_auto_stay".to_string()],
            boosts_applied: Vec::new(),
        });
    }

    // B. First message of the conversation.
    if input.branches.is_empty() {
        return Ok(Classification {
            action: RouteAction::Branch,
            drift_action: DriftAction::BranchNewCluster,
            target_branch_id: None,
            new_branch_topic: Some(extract_topic(input.content)),
            similarity: 0.0,
            confidence: 1.0,
            reason: "first_branch".to_string(),
            reason_codes: vec!["first_branch".to_string()],
            boosts_applied: Vec::new(),
        });
    }

    let current = input.current.ok_or_else(|| {
        braid_core::Error::internal("branches loaded but no current branch resolved")
    })?;

    // C. A branch whose centroid has not initialized yet absorbs the message.
    if current.centroid.is_empty() {
        return Ok(Classification {
            action: RouteAction::Stay,
            drift_action: DriftAction::Stay,
            target_branch_id: Some(current.id.clone()),
            new_branch_topic: None,
            similarity: 1.0,
            confidence: 1.0,
            reason: "branch_no_centroid".to_string(),
            reason_codes: vec!["branch_no_centroid".to_string()],
            boosts_applied: Vec::new(),
        });
    }

    // D. Score the current branch. With a previous message available the
    // sidecar supplies contextual boosts; without one (or when the analysis
    // endpoint fails) fall back to raw cosine against the centroid.
    let analysis = match input.last_message_content {
        Some(previous) => {
            match embeddings
                .analyze_drift(
                    input.content,
                    previous,
                    input.embedding,
                    &current.centroid,
                    input.policy.preprocess,
                )
                .await
            {
                Ok(analysis) => analysis,
                Err(err) => {
                    tracing::warn!(error = %err, branch_id = %current.id,
                        "drift analysis failed, falling back to raw cosine");
                    DriftAnalysis::raw_only(cosine(input.embedding, &current.centroid)?)
                }
            }
        }
        None => DriftAnalysis::raw_only(cosine(input.embedding, &current.centroid)?),
    };

    let similarity = analysis.boosted_similarity;
    let act = drift_action(
        similarity,
        input.policy.stay_threshold,
        input.policy.new_cluster_threshold,
    );

    // E. STAY on the current branch.
    if act == DriftAction::Stay {
        let mut reason = format!(
            "similar_to_current ({similarity:.2} > {:.2}",
            input.policy.stay_threshold
        );
        if !analysis.boosts_applied.is_empty() {
            reason.push_str(&format!(", boosts: {}", analysis.boosts_applied.join("+")));
        }
        reason.push(')');

        let mut reason_codes = vec!["similar_to_current".to_string()];
        reason_codes.extend(analysis.boosts_applied.iter().cloned());

        return Ok(Classification {
            action: RouteAction::Stay,
            drift_action: DriftAction::Stay,
            target_branch_id: Some(current.id.clone()),
            new_branch_topic: None,
            similarity,
            confidence: similarity,
            reason,
            reason_codes,
            boosts_applied: analysis.boosts_applied,
        });
    }

    // F. Look for an existing branch to route into.
    let topic_return = analysis.analysis.has_topic_return_signal;
    if let Some(best) = best_route_candidate(input.embedding, input.branches, topic_return)? {
        if best.score > input.policy.route_threshold {
            let mut reason = format!(
                "routing_to_existing \"{}\" ({:.2} > {:.2}",
                best.summary, best.score, input.policy.route_threshold
            );
            let mut reason_codes = vec!["route_existing".to_string()];
            if best.boosted {
                reason.push_str(", topic_return_boost");
                reason_codes.push("topic_return_signal".to_string());
            }
            reason.push(')');

            return Ok(Classification {
                action: RouteAction::Route,
                drift_action: drift_action(
                    best.score,
                    input.policy.stay_threshold,
                    input.policy.new_cluster_threshold,
                ),
                target_branch_id: Some(best.id),
                new_branch_topic: None,
                similarity: best.score,
                confidence: best.score,
                reason,
                reason_codes,
                boosts_applied: analysis.boosts_applied,
            });
        }
    }

    // G. Nothing fits: open a new branch under the current one.
    let (code, comparison) = if act == DriftAction::BranchNewCluster {
        (
            "branch_new_cluster",
            format!(
                "({similarity:.2} <= {:.2})",
                input.policy.new_cluster_threshold
            ),
        )
    } else {
        (
            "branch_same_cluster",
            format!("({similarity:.2} <= {:.2})", input.policy.stay_threshold),
        )
    };

    Ok(Classification {
        action: RouteAction::Branch,
        drift_action: act,
        target_branch_id: None,
        new_branch_topic: Some(extract_topic(input.content)),
        similarity,
        confidence: 1.0 - similarity,
        reason: format!("{code} {comparison}"),
        reason_codes: vec![code.to_string()],
        boosts_applied: analysis.boosts_applied,
    })
}

struct RouteCandidate {
    id: String,
    summary: String,
    score: f32,
    boosted: bool,
}

/// Score every non-current branch with an initialized centroid, apply the
/// topic-return boost when the signal fired, and return the best candidate.
/// Ties break by most recent update, then id.
fn best_route_candidate(
    embedding: &[f32],
    branches: &[BranchSummary],
    topic_return: bool,
) -> Result<Option<RouteCandidate>> {
    let mut candidates = Vec::new();
    for branch in branches {
        if branch.is_current || branch.centroid.is_empty() {
            continue;
        }
        let raw = cosine(embedding, &branch.centroid)?;
        let score = if topic_return {
            (raw * TOPIC_RETURN_BOOST_FACTOR).min(1.0)
        } else {
            raw
        };
        candidates.push((branch, score));
    }

    candidates.sort_by(|(a, sa), (b, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(candidates.into_iter().next().map(|(branch, score)| {
        RouteCandidate {
            id: branch.id.clone(),
            summary: branch.summary.clone(),
            score,
            boosted: topic_return,
        }
    }))
}

/// Collapse whitespace and clip to the branch-summary length cap.
pub fn extract_topic(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim();
    if trimmed.chars().count() <= braid_core::BRANCH_SUMMARY_CHARS_MAX {
        return trimmed.to_string();
    }
    let mut clipped: String = trimmed.chars().take(97).collect();
    clipped.push('…');
    clipped
}
