//! The six literal scenarios of §8, driven end-to-end against an in-process router —
//! no real TCP listener, but the same request/response path a deployed client sees.
use std::sync::Arc;

use api_router::api_routes_v1;
use api_router::api_state::ApiState;
use api_router::auth::DeterministicTokenValidator;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::storage::db::SurrealDbClient;
use common::utils::config::AppConfig;
use common::utils::embedding::{HashedEmbeddingService, UnavailableEmbeddingService};
use notebook_store::NotebookManager;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        surrealdb_address: "mem://".into(),
        surrealdb_namespace: "test".into(),
        surrealdb_database: "test".into(),
        http_port: 0,
        lease_ttl_seconds: 1,
        default_max_attempts: 5,
        compare_fanout: 20,
        review_threshold: 0.2,
        contested_threshold: 0.5,
        integrated_threshold: 0.2,
        min_comparisons: 1,
        min_similarity: 0.3,
        rrf_k: 60,
        request_deadline_seconds: 30,
    }
}

async fn test_app(degraded_embedder: bool) -> Router {
    let db = SurrealDbClient::memory("test", &uuid::Uuid::new_v4().to_string())
        .await
        .unwrap();
    db.ensure_schema().await.unwrap();
    let embedder: Arc<dyn common::utils::embedding::EmbeddingService> = if degraded_embedder {
        Arc::new(UnavailableEmbeddingService)
    } else {
        Arc::new(HashedEmbeddingService::new(32))
    };
    let state = ApiState::new(
        Arc::new(db),
        test_config(),
        Arc::new(NotebookManager::new()),
        embedder,
        Arc::new(DeterministicTokenValidator),
    );
    api_routes_v1(&state).with_state(state)
}

async fn call(app: &Router, method: &str, path: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path).header("Authorization", format!("Bearer {token}"));
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_notebook(app: &Router, owner: &str) -> String {
    let (status, body) = call(app, "POST", "/notebooks", owner, Some(json!({"name": "n"}))).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn write_entry(app: &Router, notebook_id: &str, token: &str, entry: Value) -> Value {
    let (status, body) = call(
        app,
        "POST",
        &format!("/notebooks/{notebook_id}/batch"),
        token,
        Some(json!({"entries": [entry], "author": token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["results"][0].clone()
}

async fn lease_job(app: &Router, notebook_id: &str, token: &str, worker_id: &str, job_type: Option<&str>) -> Option<Value> {
    let mut path = format!("/notebooks/{notebook_id}/jobs/next?worker_id={worker_id}");
    if let Some(t) = job_type {
        path.push_str(&format!("&type={t}"));
    }
    let (status, body) = call(app, "GET", &path, token, None).await;
    if status == StatusCode::NO_CONTENT {
        None
    } else {
        assert_eq!(status, StatusCode::OK);
        Some(body)
    }
}

async fn complete_job(app: &Router, notebook_id: &str, token: &str, job_id: &str, worker_id: &str, result: Value) {
    let (status, _) = call(
        app,
        "POST",
        &format!("/notebooks/{notebook_id}/jobs/{job_id}/complete"),
        token,
        Some(json!({"worker_id": worker_id, "result": result})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn scenario_1_fresh_write() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;

    let result = write_entry(
        &app,
        &notebook_id,
        "alice",
        json!({"content": "Earth is round", "topic": "astro"}),
    )
    .await;

    assert_eq!(result["sequence"], 1);
    assert_eq!(result["integration_cost"]["entries_revised"], 0);
    assert_eq!(result["integration_cost"]["references_broken"], 0);
    assert_eq!(result["integration_cost"]["catalog_shift"], 1.0);
    assert_eq!(result["integration_cost"]["orphan"], false);

    let stats = call(&app, "GET", &format!("/notebooks/{notebook_id}/jobs/stats"), "alice", None).await.1;
    let distill_pending = stats["stats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["job_type"] == "DISTILL_CLAIMS" && s["status"] == "pending");
    assert_eq!(distill_pending.unwrap()["count"], 1);
}

#[tokio::test]
async fn scenario_2_contradiction_marks_both_entries_contested() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;

    let e1 = write_entry(&app, &notebook_id, "alice", json!({"content": "Earth is round", "topic": "astro"})).await;
    let job1 = lease_job(&app, &notebook_id, "alice", "w1", Some("DISTILL_CLAIMS")).await.unwrap();
    complete_job(
        &app,
        &notebook_id,
        "alice",
        job1["id"].as_str().unwrap(),
        "w1",
        json!({"claims": [{"text": "Earth is round", "confidence": 0.95}]}),
    )
    .await;

    let e2 = write_entry(&app, &notebook_id, "alice", json!({"content": "Earth is flat", "topic": "astro"})).await;
    let job2 = lease_job(&app, &notebook_id, "alice", "w1", Some("DISTILL_CLAIMS")).await.unwrap();
    complete_job(
        &app,
        &notebook_id,
        "alice",
        job2["id"].as_str().unwrap(),
        "w1",
        json!({"claims": [{"text": "Earth is flat", "confidence": 0.8}]}),
    )
    .await;

    let compare_job = lease_job(&app, &notebook_id, "alice", "w1", Some("COMPARE_CLAIMS")).await.unwrap();
    complete_job(
        &app,
        &notebook_id,
        "alice",
        compare_job["id"].as_str().unwrap(),
        "w1",
        json!({
            "classifications": [
                {"new_claim": "Earth is flat", "type": "CONTRADICTS", "peer_claim": "Earth is round", "severity": 0.9}
            ]
        }),
    )
    .await;

    let (_, browse) = call(
        &app,
        "GET",
        &format!("/notebooks/{notebook_id}/browse?needs_review=true"),
        "alice",
        None,
    )
    .await;
    let ids: Vec<&str> = browse["entries"].as_array().unwrap().iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&e1["entry_id"].as_str().unwrap()));
    assert!(ids.contains(&e2["entry_id"].as_str().unwrap()));

    for entry in browse["entries"].as_array().unwrap() {
        assert_eq!(entry["integration_status"], "contested");
    }
}

#[tokio::test]
async fn scenario_3_revision_inherits_topic_and_surfaces_in_detail() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;

    let e1 = write_entry(&app, &notebook_id, "alice", json!({"content": "v1", "topic": "x"})).await;
    let e1_id = e1["entry_id"].as_str().unwrap().to_string();

    let e2 = write_entry(&app, &notebook_id, "alice", json!({"content": "v2", "revision_of": e1_id})).await;
    assert_eq!(e2["integration_cost"]["references_broken"], 0);

    let (status, e2_detail) = call(&app, "GET", &format!("/notebooks/{notebook_id}/entries/{}", e2["entry_id"].as_str().unwrap()), "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(e2_detail["entry"]["topic"], "x");

    let (_, e1_detail) = call(&app, "GET", &format!("/notebooks/{notebook_id}/entries/{e1_id}"), "alice", None).await;
    let revision_ids: Vec<&str> = e1_detail["revisions"].as_array().unwrap().iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert!(revision_ids.contains(&e2["entry_id"].as_str().unwrap()));
}

#[tokio::test]
async fn scenario_4_hybrid_search_degrades_when_embedding_unavailable() {
    let app = test_app(true).await;
    let notebook_id = create_notebook(&app, "alice").await;
    write_entry(&app, &notebook_id, "alice", json!({"content": "rockets use liquid fuel", "topic": "space"})).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/notebooks/{notebook_id}/hybrid-search"),
        "alice",
        Some(json!({"query": "rockets", "top_k": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["note"].as_str().unwrap().contains("semantic"));
    assert!(!body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn scenario_5_expired_lease_is_reclaimed_by_another_worker() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;
    write_entry(&app, &notebook_id, "alice", json!({"content": "Earth is round", "topic": "astro"})).await;

    let job = lease_job(&app, &notebook_id, "alice", "w1", Some("DISTILL_CLAIMS")).await.unwrap();
    let job_id = job["id"].as_str().unwrap().to_string();
    assert_eq!(job["attempts"], 1);

    // test_config sets a 1s lease TTL; sleep past it so w2 can reclaim.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let reclaimed = lease_job(&app, &notebook_id, "alice", "w2", Some("DISTILL_CLAIMS")).await.unwrap();
    assert_eq!(reclaimed["id"], job_id);
    assert_eq!(reclaimed["attempts"], 2);

    complete_job(&app, &notebook_id, "alice", &job_id, "w2", json!({"claims": []})).await;

    let (status, _) = call(
        &app,
        "POST",
        &format!("/notebooks/{notebook_id}/jobs/{job_id}/complete"),
        "alice",
        Some(json!({"worker_id": "w1", "result": {"claims": []}})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn scenario_6_unresolvable_references_are_dropped_and_counted() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;
    let e1 = write_entry(&app, &notebook_id, "alice", json!({"content": "first entry", "topic": "misc"})).await;
    let e1_id = e1["entry_id"].as_str().unwrap().to_string();

    let result = write_entry(
        &app,
        &notebook_id,
        "alice",
        json!({
            "content": "second entry",
            "topic": "misc",
            "references": [e1_id, "00000000-0000-0000-0000-000000000000"]
        }),
    )
    .await;

    assert_eq!(result["integration_cost"]["references_broken"], 1);

    let (_, detail) = call(
        &app,
        "GET",
        &format!("/notebooks/{notebook_id}/entries/{}", result["entry_id"].as_str().unwrap()),
        "alice",
        None,
    )
    .await;
    let reference_ids: Vec<&str> = detail["references"].as_array().unwrap().iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(reference_ids, vec![e1_id.as_str()]);
}

#[tokio::test]
async fn batch_of_zero_and_over_cap_are_rejected() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;

    let (status, _) = call(
        &app,
        "POST",
        &format!("/notebooks/{notebook_id}/batch"),
        "alice",
        Some(json!({"entries": [], "author": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let entries: Vec<Value> = (0..101).map(|i| json!({"content": format!("entry {i}")})).collect();
    let (status, _) = call(
        &app,
        "POST",
        &format!("/notebooks/{notebook_id}/batch"),
        "alice",
        Some(json!({"entries": entries, "author": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_notebook_browse_and_catalog_are_empty() {
    let app = test_app(false).await;
    let notebook_id = create_notebook(&app, "alice").await;

    let (_, browse) = call(&app, "GET", &format!("/notebooks/{notebook_id}/browse"), "alice", None).await;
    assert!(browse["entries"].as_array().unwrap().is_empty());
    assert_eq!(browse["total"], 0);
}
