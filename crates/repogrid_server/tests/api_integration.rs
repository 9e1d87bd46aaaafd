//! Integration tests for the RepoGrid HTTP API.

mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};
use support::setup_test_server;

fn cursors(page: &Value) -> Vec<String> {
    page["edges"]
        .as_array()
        .expect("edges")
        .iter()
        .map(|edge| edge["cursor"].as_str().expect("cursor").to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let (server, _state) = setup_test_server(5);
    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "ok");
    response.assert_header("x-content-type-options", "nosniff");
}

#[tokio::test]
async fn test_pagination_walks_forward_with_cursors() {
    let (server, _state) = setup_test_server(120);

    let first = server
        .get("/api/repositories")
        .add_query_param("first", 50)
        .add_query_param("order_field", "STARGAZERS")
        .add_query_param("order_direction", "DESC")
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let first: Value = first.json();
    assert_eq!(first["total_count"], 120);
    assert_eq!(first["has_next_page"], true);
    let first_cursors = cursors(&first);
    assert_eq!(first_cursors.len(), 50);

    let second: Value = server
        .get("/api/repositories")
        .add_query_param("first", 40)
        .add_query_param("after", first_cursors.last().expect("last cursor"))
        .add_query_param("order_field", "STARGAZERS")
        .add_query_param("order_direction", "DESC")
        .await
        .json();
    let second_cursors = cursors(&second);
    assert_eq!(second_cursors.len(), 40);
    assert!(second_cursors.iter().all(|c| !first_cursors.contains(c)));

    let stars: Vec<u64> = first["edges"]
        .as_array()
        .expect("edges")
        .iter()
        .chain(second["edges"].as_array().expect("edges"))
        .map(|edge| edge["node"]["stargazer_count"].as_u64().expect("stars"))
        .collect();
    assert!(stars.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_cursor_from_other_ordering_is_rejected() {
    let (server, _state) = setup_test_server(30);
    let page: Value = server
        .get("/api/repositories")
        .add_query_param("first", 10)
        .await
        .json();
    let cursor = cursors(&page).pop().expect("cursor");

    let response = server
        .get("/api/repositories")
        .add_query_param("after", cursor)
        .add_query_param("order_field", "NAME")
        .add_query_param("order_direction", "ASC")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("ordering"));
}

#[tokio::test]
async fn test_page_size_and_sort_validation() {
    let (server, _state) = setup_test_server(10);
    for first in [0, 101] {
        let response = server
            .get("/api/repositories")
            .add_query_param("first", first)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
    let response = server
        .get("/api/repositories")
        .add_query_param("order_field", "FORKS")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_lifecycle() {
    let (server, state) = setup_test_server(20);
    let page: Value = server
        .get("/api/repositories")
        .add_query_param("first", 2)
        .await
        .json();
    let id = page["edges"][0]["node"]["id"].as_str().expect("id").to_string();
    let taken = page["edges"][1]["node"]["name"]
        .as_str()
        .expect("name")
        .to_string();

    let renamed = server
        .put(&format!("/api/repositories/{}/name", id))
        .json(&json!({ "name": "renamed-repo" }))
        .await;
    assert_eq!(renamed.status_code(), StatusCode::OK);
    let body: Value = renamed.json();
    assert_eq!(body["repository"]["name"], "renamed-repo");
    assert_eq!(body["field_errors"], json!([]));
    assert_eq!(
        state
            .catalog
            .read()
            .expect("catalog")
            .get(&id)
            .map(|repo| repo.name.clone()),
        Some("renamed-repo".to_string())
    );

    let rejected = server
        .put(&format!("/api/repositories/{}/name", id))
        .json(&json!({ "name": taken }))
        .await;
    assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = rejected.json();
    assert_eq!(body["repository"], Value::Null);
    assert_eq!(body["field_errors"][0]["field"], "name");

    let missing = server
        .put("/api/repositories/does-not-exist/name")
        .json(&json!({ "name": "whatever" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}
