//! End-to-end routing scenarios through the REST surface
//!
//! Follows one conversation through BRANCH / STAY / BRANCH / ROUTE and the
//! validation and degradation paths around it.

mod common;

use axum::http::StatusCode;
use common::{get_json, post_json, route, test_app};
use serde_json::json;

#[tokio::test]
async fn test_first_message_opens_a_branch() {
    let harness = test_app();

    let data = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "I want to book a hotel in Paris for my trip next month",
        }),
    )
    .await;

    assert_eq!(data["action"], "BRANCH");
    assert_eq!(data["driftAction"], "BRANCH_NEW_CLUSTER");
    assert_eq!(data["isNewBranch"], true);
    assert_eq!(data["isNewCluster"], true);
    assert_eq!(data["similarity"], 0.0);
    assert_eq!(data["conversationId"], "c1");
    assert!(data.get("previousBranchId").is_none());

    let codes: Vec<&str> = data["reasonCodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(codes.contains(&"new_conversation"));
    assert!(codes.contains(&"first_branch"));

    // exactly one branch exists, and it is the one the result names
    let (status, body) = get_json(&harness.app, "/conversations/c1/branches").await;
    assert_eq!(status, StatusCode::OK);
    let branches = body["data"].as_array().unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0]["id"], data["branchId"]);
    assert_eq!(branches[0]["isCurrent"], true);
}

#[tokio::test]
async fn test_paraphrase_stays_on_branch() {
    let harness = test_app();

    let first = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "I want to book a hotel in Paris for my trip next month",
        }),
    )
    .await;

    let second = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Looking to reserve accommodation in Paris for next month",
        }),
    )
    .await;

    assert_eq!(second["action"], "STAY");
    assert_eq!(second["branchId"], first["branchId"]);
    assert!(second["similarity"].as_f64().unwrap() > 0.47);
    assert!(second["reason"]
        .as_str()
        .unwrap()
        .starts_with("similar_to_current"));
}

#[tokio::test]
async fn test_unrelated_topic_branches_into_new_cluster() {
    let harness = test_app();

    route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "I want to book a hotel in Paris for my trip next month",
        }),
    )
    .await;
    route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Looking to reserve accommodation in Paris for next month",
        }),
    )
    .await;

    let third = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "How do I fix a Python memory leak?",
        }),
    )
    .await;

    assert_eq!(third["action"], "BRANCH");
    assert_eq!(third["driftAction"], "BRANCH_NEW_CLUSTER");
    assert_eq!(third["isNewBranch"], true);
    assert!(third.get("previousBranchId").is_some());

    let (_, body) = get_json(&harness.app, "/conversations/c1/branches").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_topic_return_routes_back() {
    let harness = test_app();

    let first = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "I want to book a hotel in Paris for my trip next month",
        }),
    )
    .await;
    route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Looking to reserve accommodation in Paris for next month",
        }),
    )
    .await;
    route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "How do I fix a Python memory leak?",
        }),
    )
    .await;

    let fourth = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Back to the Paris hotel - can you book something near the Eiffel Tower for my trip next month?",
        }),
    )
    .await;

    assert_eq!(fourth["action"], "ROUTE", "got: {fourth}");
    assert_eq!(fourth["branchId"], first["branchId"]);
    assert_eq!(fourth["isNewBranch"], false);
    let codes: Vec<&str> = fourth["reasonCodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(codes.contains(&"route_existing"));
    assert!(codes.contains(&"topic_return_signal"));
    assert!(fourth["similarity"].as_f64().unwrap() > 0.42);
}

#[tokio::test]
async fn test_assistant_never_branches() {
    let harness = test_app();

    let first = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "I want to book a hotel in Paris for my trip next month",
        }),
    )
    .await;

    let reply = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "role": "assistant",
            "content": "Completely unrelated assistant text about quantum chromodynamics",
        }),
    )
    .await;

    assert_eq!(reply["action"], "STAY");
    assert_eq!(reply["branchId"], first["branchId"]);
    assert_eq!(reply["similarity"], 1.0);
    assert_eq!(reply["reason"], "assistant_auto_stay");

    let (_, body) = get_json(&harness.app, "/conversations/c1/branches").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let harness = test_app();

    let (status, body) = post_json(
        &harness.app,
        "/messages",
        json!({"conversationId": "c1", "content": ""}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("content"));
}

#[tokio::test]
async fn test_empty_conversation_id_rejected() {
    let harness = test_app();

    let (status, body) = post_json(
        &harness.app,
        "/messages",
        json!({"conversationId": "  ", "content": "hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("conversationId"));
}

#[tokio::test]
async fn test_bad_role_rejected() {
    let harness = test_app();

    let (status, body) = post_json(
        &harness.app,
        "/messages",
        json!({"conversationId": "c1", "content": "hello", "role": "system"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("role"));
}

#[tokio::test]
async fn test_unknown_current_branch_rejected() {
    let harness = test_app();

    route(
        &harness.app,
        json!({"conversationId": "c1", "content": "hello branch world"}),
    )
    .await;

    let (status, body) = post_json(
        &harness.app,
        "/messages",
        json!({
            "conversationId": "c1",
            "content": "another message",
            "currentBranchId": "no-such-branch",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("no-such-branch"));
}

#[tokio::test]
async fn test_pinned_current_branch_is_respected() {
    let harness = test_app();

    let first = route(
        &harness.app,
        json!({"conversationId": "c1", "content": "I want to book a hotel in Paris for my trip next month"}),
    )
    .await;
    let second = route(
        &harness.app,
        json!({"conversationId": "c1", "content": "How do I fix a Python memory leak?"}),
    )
    .await;
    assert_ne!(first["branchId"], second["branchId"]);

    // pin the hotel branch even though the python branch is more recent
    let pinned = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Looking to reserve accommodation in Paris for next month",
            "currentBranchId": first["branchId"],
        }),
    )
    .await;
    assert_eq!(pinned["action"], "STAY");
    assert_eq!(pinned["branchId"], first["branchId"]);
}

#[tokio::test]
async fn test_embedding_outage_surfaces_error() {
    let harness = test_app();
    harness.embeddings.set_fail_embed(true);

    let (status, body) = post_json(
        &harness.app,
        "/messages",
        json!({"conversationId": "c1", "content": "hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/embed"));

    // nothing was committed
    let (_, branches) = get_json(&harness.app, "/conversations/c1/branches").await;
    assert_eq!(branches["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_analysis_outage_degrades_silently() {
    let harness = test_app();

    route(
        &harness.app,
        json!({"conversationId": "c1", "content": "I want to book a hotel in Paris for my trip next month"}),
    )
    .await;

    harness.embeddings.set_fail_analysis(true);
    let second = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Looking to reserve accommodation in Paris for next month",
        }),
    )
    .await;

    // raw cosine still clears the stay threshold
    assert_eq!(second["action"], "STAY");
    assert_eq!(second["metadata"]["boostsApplied"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_drift_route_alias() {
    let harness = test_app();

    let (status, body) = post_json(
        &harness.app,
        "/drift/route",
        json!({"conversationId": "c1", "content": "hello from the alias"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["action"], "BRANCH");
}

#[tokio::test]
async fn test_threshold_overrides_apply_per_request() {
    let harness = test_app();

    route(
        &harness.app,
        json!({"conversationId": "c1", "content": "I want to book a hotel in Paris for my trip next month"}),
    )
    .await;

    // an impossible stay threshold forces the paraphrase off the branch
    let second = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "Looking to reserve accommodation in Paris for next month",
            "stayThreshold": 0.99,
            "routeThreshold": 0.99,
        }),
    )
    .await;

    assert_eq!(second["action"], "BRANCH");
    assert_eq!(second["metadata"]["thresholds"]["stay"], 0.99);
}

#[tokio::test]
async fn test_facts_extracted_from_departed_branch() {
    let harness = test_app();

    let first = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "My name is Ada and I want to visit Paris in June for a conference",
        }),
    )
    .await;

    // drifting away settles the first branch and queues extraction
    let second = route(
        &harness.app,
        json!({"conversationId": "c1", "content": "How do I fix a Python memory leak?"}),
    )
    .await;
    assert_eq!(second["action"], "BRANCH");
    assert!(second["reasonCodes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "fact_extraction_queued"));

    // extraction is fire-and-forget; poll briefly
    let branch_id = first["branchId"].as_str().unwrap();
    let uri = format!("/branches/{branch_id}/facts");
    let mut facts = Vec::new();
    for _ in 0..50 {
        let (status, body) = get_json(&harness.app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        facts = body["data"].as_array().unwrap().clone();
        if !facts.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert!(
        facts.iter().any(|f| f["key"] == "user_name"),
        "facts: {facts:?}"
    );
}

#[tokio::test]
async fn test_fact_extraction_opt_out() {
    let harness = test_app();

    let first = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "My name is Ada and I want to visit Paris in June",
        }),
    )
    .await;

    let second = route(
        &harness.app,
        json!({
            "conversationId": "c1",
            "content": "How do I fix a Python memory leak?",
            "extractFacts": false,
        }),
    )
    .await;
    assert_eq!(second["metadata"]["factExtraction"], "skipped");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let branch_id = first["branchId"].as_str().unwrap();
    let (_, body) = get_json(&harness.app, &format!("/branches/{branch_id}/facts")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_facts_for_unknown_branch_rejected() {
    let harness = test_app();
    let (status, body) = get_json(&harness.app, "/branches/ghost/facts").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_health_reports_embedding_probe() {
    let harness = test_app();

    let (status, body) = get_json(&harness.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["embedding"]["reachable"], true);
    assert_eq!(body["embedding"]["dimension"], 384);
}
